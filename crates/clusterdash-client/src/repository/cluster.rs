use std::sync::Arc;

use async_trait::async_trait;

use clusterdash_common::ClusterStatus;

use super::{logged, ClusterRepository};
use crate::{ApiClient, Result};

pub struct HttpClusterRepository {
    api: Arc<ApiClient>,
}

impl HttpClusterRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ClusterRepository for HttpClusterRepository {
    async fn cluster_status(&self) -> Result<ClusterStatus> {
        tracing::debug!("fetching cluster status");
        logged("cluster_status", self.api.cluster_status().await)
    }
}
