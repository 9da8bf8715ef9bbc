use std::sync::Arc;

use async_trait::async_trait;

use clusterdash_common::QueueStatus;

use super::{logged, QueueRepository};
use crate::{ApiClient, Result};

pub struct HttpQueueRepository {
    api: Arc<ApiClient>,
}

impl HttpQueueRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QueueRepository for HttpQueueRepository {
    async fn queue_status(&self) -> Result<QueueStatus> {
        tracing::debug!("fetching queue status");
        logged("queue_status", self.api.queue_status().await)
    }

    async fn pause(&self) -> Result<()> {
        tracing::info!("pausing request queue");
        logged("pause_queue", self.api.pause_queue().await)
    }

    async fn resume(&self) -> Result<()> {
        tracing::info!("resuming request queue");
        logged("resume_queue", self.api.resume_queue().await)
    }
}
