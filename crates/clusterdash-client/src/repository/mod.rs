//! One repository per resource area. Each method forwards to exactly one
//! [`ApiClient`] call, logs the outcome, and hands errors back unchanged.
//! The traits are what the dashboard state holders depend on.

mod admin;
mod cluster;
mod llm;
mod model;
mod node;
mod queue;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use clusterdash_common::{
    ChatRequest, ChatResponse, ClusterStatus, GenerateRequest, GenerateResponse, LogEntry,
    LogLevel, MetricsData, Model, Node, NodeStatus, QueueStatus, SystemInfo,
};

use crate::{ApiClient, FragmentStream, Result};

pub use admin::HttpAdminRepository;
pub use cluster::HttpClusterRepository;
pub use llm::HttpLlmRepository;
pub use model::HttpModelRepository;
pub use node::HttpNodeRepository;
pub use queue::HttpQueueRepository;

#[async_trait]
pub trait NodeRepository: Send + Sync {
    async fn health(&self) -> Result<bool>;
    async fn list_nodes(&self) -> Result<Vec<Node>>;
    async fn nodes_status(&self) -> Result<HashMap<String, NodeStatus>>;
    async fn get_node(&self, node_id: &str) -> Result<Node>;
}

#[async_trait]
pub trait ModelRepository: Send + Sync {
    async fn node_models(&self, node_id: &str) -> Result<Vec<Model>>;
    async fn cluster_models(&self) -> Result<Vec<Model>>;
    async fn get_model(&self, model_id: &str) -> Result<Model>;
}

#[async_trait]
pub trait ClusterRepository: Send + Sync {
    async fn cluster_status(&self) -> Result<ClusterStatus>;
}

#[async_trait]
pub trait QueueRepository: Send + Sync {
    async fn queue_status(&self) -> Result<QueueStatus>;
    async fn pause(&self) -> Result<()>;
    async fn resume(&self) -> Result<()>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn metrics(&self) -> Result<MetricsData>;
    async fn system_info(&self) -> Result<SystemInfo>;
    async fn reset_stats(&self) -> Result<()>;
    async fn logs(&self, level: Option<LogLevel>) -> Result<Vec<LogEntry>>;
}

#[async_trait]
pub trait LlmRepository: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream<ChatResponse>>;
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse>;
    async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> Result<FragmentStream<GenerateResponse>>;
}

/// Every repository, ready to hand to the state holders.
#[derive(Clone)]
pub struct Repositories {
    pub nodes: Arc<dyn NodeRepository>,
    pub models: Arc<dyn ModelRepository>,
    pub cluster: Arc<dyn ClusterRepository>,
    pub queue: Arc<dyn QueueRepository>,
    pub admin: Arc<dyn AdminRepository>,
    pub llm: Arc<dyn LlmRepository>,
}

impl Repositories {
    /// HTTP-backed repositories sharing one client.
    pub fn http(api: Arc<ApiClient>) -> Self {
        Self {
            nodes: Arc::new(HttpNodeRepository::new(api.clone())),
            models: Arc::new(HttpModelRepository::new(api.clone())),
            cluster: Arc::new(HttpClusterRepository::new(api.clone())),
            queue: Arc::new(HttpQueueRepository::new(api.clone())),
            admin: Arc::new(HttpAdminRepository::new(api.clone())),
            llm: Arc::new(HttpLlmRepository::new(api)),
        }
    }
}

/// Log the outcome of a repository call and pass it through untouched.
fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => tracing::debug!(operation, "repository call succeeded"),
        Err(e) => tracing::error!(operation, error = %e, "repository call failed"),
    }
    result
}
