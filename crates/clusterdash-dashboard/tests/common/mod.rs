#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::Notify;

use clusterdash_client::repository::{
    AdminRepository, ClusterRepository, LlmRepository, ModelRepository, NodeRepository,
    QueueRepository, Repositories,
};
use clusterdash_client::{ClientError, FragmentStream, Result};
use clusterdash_common::{
    ChatMessage, ChatRequest, ChatResponse, ClusterStatus, GenerateRequest, GenerateResponse,
    LogEntry, LogLevel, MetricsData, Model, Node, NodeStatus, QueueStatus, SystemInfo,
};

/// Scripted stand-in for every repository.
#[derive(Default)]
pub struct FakeBackend {
    pub nodes: Mutex<Vec<Node>>,
    pub models: Mutex<Vec<Model>>,
    pub chat_fragments: Mutex<Vec<std::result::Result<String, String>>>,
    pub chat_reply: Mutex<String>,
    pub generate_fragments: Mutex<Vec<std::result::Result<String, String>>>,
    pub generate_reply: Mutex<String>,
    /// When set, fragment streams stay open after the scripted items until notified.
    pub hold: Mutex<Option<Arc<Notify>>>,
    /// When set, every call fails with this message.
    pub failure: Mutex<Option<String>>,
    /// Per-endpoint failures, keyed by endpoint path.
    pub failing_endpoints: Mutex<HashMap<&'static str, String>>,
    /// When set, `list_nodes` and `metrics` block until notified.
    pub fetch_gate: Mutex<Option<Arc<Notify>>>,
    pub queue_active: Mutex<bool>,

    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub generate_requests: Mutex<Vec<GenerateRequest>>,
    pub log_levels: Mutex<Vec<Option<LogLevel>>>,
    pub list_nodes_calls: AtomicUsize,
    pub metrics_calls: AtomicUsize,
    pub reset_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        let fake = FakeBackend::default();
        *fake.nodes.lock().unwrap() =
            vec![node("n1", NodeStatus::Online), node("n2", NodeStatus::Offline)];
        *fake.models.lock().unwrap() = vec![model("llama3", "n1")];
        *fake.queue_active.lock().unwrap() = true;
        Arc::new(fake)
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            nodes: self.clone(),
            models: self.clone(),
            cluster: self.clone(),
            queue: self.clone(),
            admin: self.clone(),
            llm: self.clone(),
        }
    }

    pub fn script_chat<I: IntoIterator<Item = &'static str>>(&self, fragments: I) {
        *self.chat_fragments.lock().unwrap() =
            fragments.into_iter().map(|f| Ok(f.to_string())).collect();
    }

    pub fn script_generate<I: IntoIterator<Item = &'static str>>(&self, fragments: I) {
        *self.generate_fragments.lock().unwrap() =
            fragments.into_iter().map(|f| Ok(f.to_string())).collect();
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_endpoint(&self, endpoint: &'static str, message: &str) {
        self.failing_endpoints
            .lock()
            .unwrap()
            .insert(endpoint, message.to_string());
    }

    /// Block `list_nodes` and `metrics` until the returned gate is notified.
    pub fn hold_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn wait_for_gate(&self) {
        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    /// Keep fragment streams open until the returned gate is notified.
    pub fn hold_streams(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn check(&self, endpoint: &str) -> Result<()> {
        let failure = self
            .failure
            .lock()
            .unwrap()
            .clone()
            .or_else(|| self.failing_endpoints.lock().unwrap().get(endpoint).cloned());
        match failure {
            Some(message) => Err(ClientError::Rejected {
                endpoint: endpoint.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    fn fragment_stream<T, F>(
        &self,
        endpoint: &'static str,
        items: Vec<std::result::Result<String, String>>,
        to_fragment: F,
    ) -> FragmentStream<T>
    where
        T: Send + 'static,
        F: Fn(String) -> T + Send + 'static,
    {
        let scripted = stream::iter(items).map(move |item| {
            item.map(&to_fragment).map_err(|message| ClientError::Rejected {
                endpoint: endpoint.to_string(),
                message,
            })
        });
        match self.hold.lock().unwrap().clone() {
            Some(gate) => {
                let held = stream::once(async move { gate.notified().await })
                    .filter_map(|_| async { None::<Result<T>> });
                Box::pin(scripted.chain(held))
            }
            None => Box::pin(scripted),
        }
    }
}

pub fn node(id: &str, status: NodeStatus) -> Node {
    Node {
        id: Some(id.to_string()),
        name: Some(format!("{id}-host")),
        status: Some(status),
        ..Default::default()
    }
}

pub fn model(name: &str, node_id: &str) -> Model {
    Model {
        id: Some(format!("{node_id}/{name}")),
        name: Some(name.to_string()),
        node_id: Some(node_id.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl NodeRepository for FakeBackend {
    async fn health(&self) -> Result<bool> {
        self.check("health")?;
        Ok(true)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.list_nodes_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.check("api/nodes")?;
        Ok(self.nodes.lock().unwrap().clone())
    }

    async fn nodes_status(&self) -> Result<HashMap<String, NodeStatus>> {
        self.check("api/nodes/status")?;
        Ok(self
            .nodes
            .lock()
            .unwrap()
            .iter()
            .map(|n| (n.id.clone().unwrap_or_default(), n.status.unwrap_or_default()))
            .collect())
    }

    async fn get_node(&self, node_id: &str) -> Result<Node> {
        self.check("api/nodes/{id}")?;
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id.as_deref() == Some(node_id))
            .cloned()
            .ok_or_else(|| ClientError::MissingData {
                endpoint: format!("api/nodes/{node_id}"),
            })
    }
}

#[async_trait]
impl ModelRepository for FakeBackend {
    async fn node_models(&self, node_id: &str) -> Result<Vec<Model>> {
        self.check("api/nodes/{id}/models")?;
        Ok(self
            .models
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.node_id.as_deref() == Some(node_id))
            .cloned()
            .collect())
    }

    async fn cluster_models(&self) -> Result<Vec<Model>> {
        self.check("api/cluster/models")?;
        Ok(self.models.lock().unwrap().clone())
    }

    async fn get_model(&self, model_id: &str) -> Result<Model> {
        self.check("api/cluster/models/{id}")?;
        self.models
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id.as_deref() == Some(model_id))
            .cloned()
            .ok_or_else(|| ClientError::MissingData {
                endpoint: format!("api/cluster/models/{model_id}"),
            })
    }
}

#[async_trait]
impl ClusterRepository for FakeBackend {
    async fn cluster_status(&self) -> Result<ClusterStatus> {
        self.check("api/cluster/status")?;
        let nodes = self.nodes.lock().unwrap().clone();
        Ok(ClusterStatus {
            total_nodes: Some(nodes.len() as u32),
            online_nodes: Some(nodes.iter().filter(|n| n.is_online()).count() as u32),
            ..Default::default()
        })
    }
}

#[async_trait]
impl QueueRepository for FakeBackend {
    async fn queue_status(&self) -> Result<QueueStatus> {
        self.check("api/queue/status")?;
        Ok(QueueStatus {
            active: Some(*self.queue_active.lock().unwrap()),
            pending: Some(2),
            ..Default::default()
        })
    }

    async fn pause(&self) -> Result<()> {
        self.check("api/queue/pause")?;
        *self.queue_active.lock().unwrap() = false;
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.check("api/queue/resume")?;
        *self.queue_active.lock().unwrap() = true;
        Ok(())
    }
}

#[async_trait]
impl AdminRepository for FakeBackend {
    async fn metrics(&self) -> Result<MetricsData> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.check("admin/metrics")?;
        let total = if self.reset_calls.load(Ordering::SeqCst) > 0 { 0 } else { 100 };
        Ok(MetricsData {
            total_requests: Some(total),
            ..Default::default()
        })
    }

    async fn system_info(&self) -> Result<SystemInfo> {
        self.check("admin/system")?;
        Ok(SystemInfo {
            version: Some("1.4.0".to_string()),
            ..Default::default()
        })
    }

    async fn reset_stats(&self) -> Result<()> {
        self.check("admin/reset-stats")?;
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn logs(&self, level: Option<LogLevel>) -> Result<Vec<LogEntry>> {
        self.log_levels.lock().unwrap().push(level);
        self.check("admin/logs")?;
        let entry = |level: &str| LogEntry {
            level: Some(level.to_string()),
            message: Some(format!("{level} line")),
            ..Default::default()
        };
        Ok(match level {
            Some(level) => vec![entry(level.as_str())],
            None => vec![entry("info"), entry("error")],
        })
    }
}

#[async_trait]
impl LlmRepository for FakeBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.chat_requests.lock().unwrap().push(request.clone());
        self.check("api/chat")?;
        Ok(ChatResponse {
            message: Some(ChatMessage::assistant(self.chat_reply.lock().unwrap().clone())),
            ..Default::default()
        })
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream<ChatResponse>> {
        self.chat_requests.lock().unwrap().push(request.clone());
        self.check("api/chat")?;
        let items = self.chat_fragments.lock().unwrap().clone();
        Ok(self.fragment_stream("api/chat", items, |text| ChatResponse {
            message: Some(ChatMessage::assistant(text)),
            ..Default::default()
        }))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        self.generate_requests.lock().unwrap().push(request.clone());
        self.check("api/generate")?;
        Ok(GenerateResponse {
            text: Some(self.generate_reply.lock().unwrap().clone()),
            ..Default::default()
        })
    }

    async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> Result<FragmentStream<GenerateResponse>> {
        self.generate_requests.lock().unwrap().push(request.clone());
        self.check("api/generate")?;
        let items = self.generate_fragments.lock().unwrap().clone();
        Ok(self.fragment_stream("api/generate", items, |text| GenerateResponse {
            text: Some(text),
            ..Default::default()
        }))
    }
}
