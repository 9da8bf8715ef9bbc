use std::sync::Arc;

use async_trait::async_trait;

use clusterdash_common::Model;

use super::{logged, ModelRepository};
use crate::{ApiClient, Result};

pub struct HttpModelRepository {
    api: Arc<ApiClient>,
}

impl HttpModelRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ModelRepository for HttpModelRepository {
    async fn node_models(&self, node_id: &str) -> Result<Vec<Model>> {
        tracing::debug!(%node_id, "listing node models");
        logged("node_models", self.api.node_models(node_id).await)
    }

    async fn cluster_models(&self) -> Result<Vec<Model>> {
        tracing::debug!("listing cluster models");
        logged("cluster_models", self.api.cluster_models().await)
    }

    async fn get_model(&self, model_id: &str) -> Result<Model> {
        tracing::debug!(%model_id, "fetching model");
        logged("get_model", self.api.cluster_model(model_id).await)
    }
}
