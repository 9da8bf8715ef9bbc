use std::sync::Arc;

use async_trait::async_trait;

use clusterdash_common::{LogEntry, LogLevel, MetricsData, SystemInfo};

use super::{logged, AdminRepository};
use crate::{ApiClient, Result};

pub struct HttpAdminRepository {
    api: Arc<ApiClient>,
}

impl HttpAdminRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AdminRepository for HttpAdminRepository {
    async fn metrics(&self) -> Result<MetricsData> {
        tracing::debug!("fetching metrics");
        logged("metrics", self.api.metrics().await)
    }

    async fn system_info(&self) -> Result<SystemInfo> {
        tracing::debug!("fetching system info");
        logged("system_info", self.api.system_info().await)
    }

    async fn reset_stats(&self) -> Result<()> {
        tracing::info!("resetting backend statistics");
        logged("reset_stats", self.api.reset_stats().await)
    }

    async fn logs(&self, level: Option<LogLevel>) -> Result<Vec<LogEntry>> {
        tracing::debug!(?level, "fetching logs");
        logged("logs", self.api.logs(level).await)
    }
}
