use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use clusterdash_client::repository::AdminRepository;
use clusterdash_common::{MetricsData, SystemInfo};

use crate::observable::Observable;
use crate::poller::{spawn_poll_loop, PollSlot};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsState {
    pub metrics: Option<MetricsData>,
    pub system: Option<SystemInfo>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

struct MetricsInner {
    admin: Arc<dyn AdminRepository>,
    state: Observable<MetricsState>,
    refreshing: Mutex<()>,
}

impl MetricsInner {
    async fn refresh(&self) -> bool {
        let Ok(_running) = self.refreshing.try_lock() else {
            tracing::debug!("metrics refresh already in flight");
            return false;
        };

        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        let _loading = self.state.reset_on_drop(|s| s.loading = false);

        match tokio::try_join!(self.admin.metrics(), self.admin.system_info()) {
            Ok((metrics, system)) => self.state.update(|s| {
                s.metrics = Some(metrics);
                s.system = Some(system);
                s.last_refreshed = Some(Utc::now());
            }),
            Err(e) => {
                tracing::error!(error = %e, "metrics refresh failed");
                self.state.update(|s| s.error = Some(e.to_string()));
            }
        }
        true
    }
}

/// Read-only monitoring screen.
pub struct MetricsViewModel {
    inner: Arc<MetricsInner>,
    lifetime: CancellationToken,
    poller: PollSlot,
}

impl MetricsViewModel {
    pub fn new(admin: Arc<dyn AdminRepository>) -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                admin,
                state: Observable::new(MetricsState::default()),
                refreshing: Mutex::new(()),
            }),
            lifetime: CancellationToken::new(),
            poller: PollSlot::default(),
        }
    }

    pub fn state(&self) -> &Observable<MetricsState> {
        &self.inner.state
    }

    pub async fn refresh(&self) -> bool {
        self.inner.refresh().await
    }

    pub fn start_polling(&self, interval: Duration) {
        let inner = self.inner.clone();
        let handle = spawn_poll_loop("metrics", interval, &self.lifetime, move || {
            let inner = inner.clone();
            async move {
                inner.refresh().await;
            }
        });
        self.poller.replace(handle);
    }

    pub fn stop_polling(&self) -> bool {
        self.poller.stop()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    pub fn dispose(&self) {
        self.lifetime.cancel();
    }
}

impl Drop for MetricsViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}
