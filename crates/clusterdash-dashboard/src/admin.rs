use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use clusterdash_client::repository::AdminRepository;
use clusterdash_common::{LogEntry, LogLevel, MetricsData, SystemInfo};

use crate::observable::Observable;
use crate::poller::{spawn_poll_loop, PollSlot};
use crate::MIN_AUTO_REFRESH_INTERVAL;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdminState {
    pub metrics: Option<MetricsData>,
    pub system: Option<SystemInfo>,
    pub logs: Vec<LogEntry>,
    /// `None` shows every level.
    pub log_level: Option<LogLevel>,
    /// Period of the running auto-refresh, if any.
    pub auto_refresh: Option<Duration>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

struct AdminInner {
    admin: Arc<dyn AdminRepository>,
    state: Observable<AdminState>,
    refreshing: Mutex<()>,
}

impl AdminInner {
    async fn refresh(&self) -> bool {
        let Ok(_running) = self.refreshing.try_lock() else {
            tracing::debug!("admin refresh already in flight");
            return false;
        };

        let level = self.state.read(|s| s.log_level);
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        let _loading = self.state.reset_on_drop(|s| s.loading = false);

        let result = tokio::try_join!(
            self.admin.metrics(),
            self.admin.system_info(),
            self.admin.logs(level),
        );
        match result {
            Ok((metrics, system, logs)) => self.state.update(|s| {
                s.metrics = Some(metrics);
                s.system = Some(system);
                // A filter change during the fetch makes these logs stale.
                if s.log_level == level {
                    s.logs = logs;
                }
                s.last_refreshed = Some(Utc::now());
            }),
            Err(e) => {
                tracing::error!(error = %e, "admin refresh failed");
                self.state.update(|s| s.error = Some(e.to_string()));
            }
        }
        true
    }

    async fn reload_logs(&self) {
        let level = self.state.read(|s| s.log_level);
        match self.admin.logs(level).await {
            Ok(logs) => self.state.update(|s| {
                if s.log_level == level {
                    s.logs = logs;
                }
            }),
            Err(e) => {
                tracing::error!(error = %e, ?level, "failed to load logs");
                self.state.update(|s| s.error = Some(e.to_string()));
            }
        }
    }
}

/// Administration screen: metrics, logs, statistics reset, auto-refresh.
pub struct AdminViewModel {
    inner: Arc<AdminInner>,
    lifetime: CancellationToken,
    auto_refresh: PollSlot,
}

impl AdminViewModel {
    pub fn new(admin: Arc<dyn AdminRepository>) -> Self {
        Self {
            inner: Arc::new(AdminInner {
                admin,
                state: Observable::new(AdminState::default()),
                refreshing: Mutex::new(()),
            }),
            lifetime: CancellationToken::new(),
            auto_refresh: PollSlot::default(),
        }
    }

    pub fn state(&self) -> &Observable<AdminState> {
        &self.inner.state
    }

    pub async fn refresh(&self) -> bool {
        self.inner.refresh().await
    }

    /// Change the log filter and reload the logs.
    pub async fn set_log_level(&self, level: Option<LogLevel>) {
        self.inner.state.update(|s| s.log_level = level);
        self.inner.reload_logs().await;
    }

    /// Zero the backend counters, then reload so the screen shows the reset.
    pub async fn reset_stats(&self) {
        match self.inner.admin.reset_stats().await {
            Ok(()) => {
                tracing::info!("backend statistics reset");
                self.inner.refresh().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to reset statistics");
                self.inner.state.update(|s| s.error = Some(e.to_string()));
            }
        }
    }

    /// Start (or restart) auto-refresh. Intervals below the minimum are raised
    /// to it; the effective interval is returned.
    pub fn enable_auto_refresh(&self, interval: Duration) -> Duration {
        let interval = interval.max(MIN_AUTO_REFRESH_INTERVAL);
        let inner = self.inner.clone();
        let handle = spawn_poll_loop("admin", interval, &self.lifetime, move || {
            let inner = inner.clone();
            async move {
                inner.refresh().await;
            }
        });
        self.auto_refresh.replace(handle);
        self.inner.state.update(|s| s.auto_refresh = Some(interval));
        interval
    }

    pub fn disable_auto_refresh(&self) -> bool {
        let stopped = self.auto_refresh.stop();
        self.inner.state.update(|s| s.auto_refresh = None);
        stopped
    }

    pub fn dispose(&self) {
        self.lifetime.cancel();
        self.inner.state.update(|s| s.auto_refresh = None);
    }
}

impl Drop for AdminViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}
