use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use clusterdash_client::repository::{
    ClusterRepository, ModelRepository, NodeRepository, QueueRepository, Repositories,
};
use clusterdash_client::ClientError;
use clusterdash_common::{ClusterStatus, Model, Node, QueueStatus};

use crate::observable::Observable;
use crate::poller::{spawn_poll_loop, PollSlot};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeDetail {
    pub node: Node,
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub healthy: Option<bool>,
    pub nodes: Vec<Node>,
    pub cluster: Option<ClusterStatus>,
    pub models: Vec<Model>,
    pub queue: Option<QueueStatus>,
    pub selected_node: Option<NodeDetail>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

struct DashboardInner {
    nodes: Arc<dyn NodeRepository>,
    models: Arc<dyn ModelRepository>,
    cluster: Arc<dyn ClusterRepository>,
    queue: Arc<dyn QueueRepository>,
    state: Observable<DashboardState>,
    refreshing: Mutex<()>,
}

impl DashboardInner {
    async fn refresh(&self) -> bool {
        let Ok(_running) = self.refreshing.try_lock() else {
            tracing::debug!("dashboard refresh already in flight");
            return false;
        };

        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        let _loading = self.state.reset_on_drop(|s| s.loading = false);

        let (healthy, nodes, cluster, models, queue) = tokio::join!(
            self.nodes.health(),
            self.nodes.list_nodes(),
            self.cluster.cluster_status(),
            self.models.cluster_models(),
            self.queue.queue_status(),
        );

        // Each resource is applied on its own; one failing endpoint leaves the
        // others current and the failed one at its previous value.
        let mut failures: Vec<ClientError> = Vec::new();
        self.state.update(|s| {
            match healthy {
                Ok(healthy) => s.healthy = Some(healthy),
                Err(e) => failures.push(e),
            }
            match nodes {
                Ok(nodes) => s.nodes = nodes,
                Err(e) => failures.push(e),
            }
            match cluster {
                Ok(cluster) => s.cluster = Some(cluster),
                Err(e) => failures.push(e),
            }
            match models {
                Ok(models) => s.models = models,
                Err(e) => failures.push(e),
            }
            match queue {
                Ok(queue) => s.queue = Some(queue),
                Err(e) => failures.push(e),
            }
            if failures.is_empty() {
                s.last_refreshed = Some(Utc::now());
            } else {
                let messages: Vec<String> = failures.iter().map(ToString::to_string).collect();
                s.error = Some(messages.join("; "));
            }
        });

        if failures.is_empty() {
            tracing::debug!("dashboard refreshed");
        }
        for e in &failures {
            tracing::error!(error = %e, "dashboard refresh failed");
        }
        true
    }
}

/// Cluster overview screen: nodes, models, queue, and health.
pub struct DashboardViewModel {
    inner: Arc<DashboardInner>,
    lifetime: CancellationToken,
    poller: PollSlot,
}

impl DashboardViewModel {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            inner: Arc::new(DashboardInner {
                nodes: repos.nodes.clone(),
                models: repos.models.clone(),
                cluster: repos.cluster.clone(),
                queue: repos.queue.clone(),
                state: Observable::new(DashboardState::default()),
                refreshing: Mutex::new(()),
            }),
            lifetime: CancellationToken::new(),
            poller: PollSlot::default(),
        }
    }

    pub fn state(&self) -> &Observable<DashboardState> {
        &self.inner.state
    }

    /// Reload everything. Returns false if a refresh was already running.
    pub async fn refresh(&self) -> bool {
        self.inner.refresh().await
    }

    /// Load one node and its models into `selected_node`.
    pub async fn select_node(&self, node_id: &str) {
        let inner = &self.inner;
        let result = tokio::try_join!(
            inner.nodes.get_node(node_id),
            inner.models.node_models(node_id),
        );
        match result {
            Ok((node, models)) => inner.state.update(|s| {
                s.selected_node = Some(NodeDetail { node, models });
                s.error = None;
            }),
            Err(e) => {
                tracing::error!(error = %e, %node_id, "failed to load node");
                inner.state.update(|s| s.error = Some(e.to_string()));
            }
        }
    }

    pub fn clear_selection(&self) {
        self.inner.state.update(|s| s.selected_node = None);
    }

    pub async fn pause_queue(&self) {
        self.set_queue_paused(true).await;
    }

    pub async fn resume_queue(&self) {
        self.set_queue_paused(false).await;
    }

    async fn set_queue_paused(&self, paused: bool) {
        let inner = &self.inner;
        let result = if paused {
            inner.queue.pause().await
        } else {
            inner.queue.resume().await
        };
        let result = match result {
            Ok(()) => inner.queue.queue_status().await,
            Err(e) => Err(e),
        };
        match result {
            Ok(queue) => inner.state.update(|s| {
                s.queue = Some(queue);
                s.error = None;
            }),
            Err(e) => {
                tracing::error!(error = %e, paused, "failed to change queue state");
                inner.state.update(|s| s.error = Some(e.to_string()));
            }
        }
    }

    /// Refresh now and then every `interval` until stopped or disposed.
    pub fn start_polling(&self, interval: Duration) {
        let inner = self.inner.clone();
        let handle = spawn_poll_loop("dashboard", interval, &self.lifetime, move || {
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

impl Drop for DashboardViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}
