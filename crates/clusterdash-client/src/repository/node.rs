use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use clusterdash_common::{Node, NodeStatus};

use super::{logged, NodeRepository};
use crate::{ApiClient, Result};

pub struct HttpNodeRepository {
    api: Arc<ApiClient>,
}

impl HttpNodeRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl NodeRepository for HttpNodeRepository {
    async fn health(&self) -> Result<bool> {
        tracing::debug!("checking backend health");
        logged("health", self.api.health().await)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        tracing::debug!("listing nodes");
        let result = logged("list_nodes", self.api.list_nodes().await);
        if let Ok(nodes) = &result {
            tracing::debug!(count = nodes.len(), "nodes fetched");
        }
        result
    }

    async fn nodes_status(&self) -> Result<HashMap<String, NodeStatus>> {
        tracing::debug!("fetching node status map");
        logged("nodes_status", self.api.nodes_status().await)
    }

    async fn get_node(&self, node_id: &str) -> Result<Node> {
        tracing::debug!(%node_id, "fetching node");
        logged("get_node", self.api.get_node(node_id).await)
    }
}
