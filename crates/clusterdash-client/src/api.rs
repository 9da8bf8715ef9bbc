use std::collections::HashMap;
use std::pin::Pin;

use futures_core::Stream;
use http::header::ACCEPT;
use reqwest::{RequestBuilder, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use clusterdash_common::{
    ChatRequest, ChatResponse, ClusterStatus, Envelope, GenerateRequest, GenerateResponse,
    LogEntry, LogLevel, MetricsData, Model, Node, NodeStatus, QueueStatus, SystemInfo,
};

use crate::config::{
    ClientConfig, CONNECT_TIMEOUT, POOL_IDLE_TIMEOUT, POOL_MAX_IDLE_PER_HOST, READ_TIMEOUT,
    REQUEST_TIMEOUT, STREAM_TIMEOUT,
};
use crate::sse::{self, SentinelPolicy};
use crate::{ClientError, Result};

/// Fragments decoded from a streaming chat or generate response.
pub type FragmentStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

const EVENT_STREAM: &str = "text/event-stream";

/// Typed access to the cluster backend. Cheap to clone; clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()?;
        Ok(Self::with_http(config, http))
    }

    pub fn with_http(config: &ClientConfig, http: reqwest::Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, endpoint: &str, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }
        Ok(resp)
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, req: RequestBuilder) -> Result<T> {
        let resp = self.send(endpoint, req).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!(method = "GET", path, "backend request");
        self.fetch(path, self.http.get(self.url(path))).await
    }

    async fn enveloped<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: RequestBuilder,
    ) -> Result<Option<T>> {
        let envelope: Envelope<T> = self.fetch(endpoint, req).await?;
        envelope
            .into_data()
            .map_err(|e| ClientError::rejected(endpoint, e))
    }

    async fn get_enveloped<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        tracing::debug!(method = "GET", path, "backend request");
        self.enveloped(path, self.http.get(self.url(path))).await
    }

    /// POST to an endpoint whose envelope payload carries nothing of interest.
    async fn post_ack(&self, path: &str) -> Result<()> {
        tracing::debug!(method = "POST", path, "backend request");
        self.enveloped::<IgnoredAny>(path, self.http.post(self.url(path)))
            .await
            .map(|_| ())
    }

    /// Chat and generate calls last as long as the model takes, so they get
    /// the long limit whether or not they stream.
    fn completion_request<B>(&self, path: &str, body: &B) -> RequestBuilder
    where
        B: Serialize + ?Sized,
    {
        self.http
            .post(self.url(path))
            .timeout(STREAM_TIMEOUT)
            .json(body)
    }

    async fn post_completion<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(method = "POST", path, "backend request");
        self.fetch(path, self.completion_request(path, body)).await
    }

    /// Open an event stream. Failures before the first byte (transport or
    /// non-2xx status) fail the call itself; nothing is streamed.
    async fn post_stream<B, T>(&self, path: &str, body: &B) -> Result<FragmentStream<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Send + 'static,
    {
        tracing::debug!(method = "POST", path, "backend stream request");
        let req = self
            .completion_request(path, body)
            .header(ACCEPT, EVENT_STREAM);
        let resp = self.send(path, req).await?;
        Ok(Box::pin(sse::decode(
            resp.bytes_stream(),
            SentinelPolicy::Terminate,
        )))
    }

    // ── health ──────────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<bool> {
        self.get_enveloped::<bool>("health")
            .await?
            .ok_or_else(|| ClientError::MissingData {
                endpoint: "health".to_string(),
            })
    }

    // ── nodes ───────────────────────────────────────────────────────────

    pub async fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.get_enveloped("api/nodes").await?.unwrap_or_default())
    }

    pub async fn nodes_status(&self) -> Result<HashMap<String, NodeStatus>> {
        Ok(self
            .get_enveloped("api/nodes/status")
            .await?
            .unwrap_or_default())
    }

    pub async fn get_node(&self, node_id: &str) -> Result<Node> {
        self.get(&format!("api/nodes/{}", urlencoding::encode(node_id)))
            .await
    }

    pub async fn node_models(&self, node_id: &str) -> Result<Vec<Model>> {
        let path = format!("api/nodes/{}/models", urlencoding::encode(node_id));
        Ok(self.get_enveloped(&path).await?.unwrap_or_default())
    }

    // ── cluster ─────────────────────────────────────────────────────────

    pub async fn cluster_status(&self) -> Result<ClusterStatus> {
        self.get("api/cluster/status").await
    }

    pub async fn cluster_models(&self) -> Result<Vec<Model>> {
        Ok(self
            .get_enveloped("api/cluster/models")
            .await?
            .unwrap_or_default())
    }

    pub async fn cluster_model(&self, model_id: &str) -> Result<Model> {
        self.get(&format!(
            "api/cluster/models/{}",
            urlencoding::encode(model_id)
        ))
        .await
    }

    // ── queue ───────────────────────────────────────────────────────────

    pub async fn queue_status(&self) -> Result<QueueStatus> {
        self.get("api/queue/status").await
    }

    pub async fn pause_queue(&self) -> Result<()> {
        self.post_ack("api/queue/pause").await
    }

    pub async fn resume_queue(&self) -> Result<()> {
        self.post_ack("api/queue/resume").await
    }

    // ── llm ─────────────────────────────────────────────────────────────

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if request.stream {
            let request = ChatRequest {
                stream: false,
                ..request.clone()
            };
            return self.post_completion("api/chat", &request).await;
        }
        self.post_completion("api/chat", request).await
    }

    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream<ChatResponse>> {
        if !request.stream {
            let request = ChatRequest {
                stream: true,
                ..request.clone()
            };
            return self.post_stream("api/chat", &request).await;
        }
        self.post_stream("api/chat", request).await
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        if request.stream {
            let request = GenerateRequest {
                stream: false,
                ..request.clone()
            };
            return self.post_completion("api/generate", &request).await;
        }
        self.post_completion("api/generate", request).await
    }

    pub async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> Result<FragmentStream<GenerateResponse>> {
        if !request.stream {
            let request = GenerateRequest {
                stream: true,
                ..request.clone()
            };
            return self.post_stream("api/generate", &request).await;
        }
        self.post_stream("api/generate", request).await
    }

    // ── admin ───────────────────────────────────────────────────────────

    pub async fn metrics(&self) -> Result<MetricsData> {
        self.get("admin/metrics").await
    }

    pub async fn system_info(&self) -> Result<SystemInfo> {
        self.get("admin/system").await
    }

    pub async fn reset_stats(&self) -> Result<()> {
        self.post_ack("admin/reset-stats").await
    }

    pub async fn logs(&self, level: Option<LogLevel>) -> Result<Vec<LogEntry>> {
        let path = "admin/logs";
        tracing::debug!(method = "GET", path, ?level, "backend request");
        let mut req = self.http.get(self.url(path));
        if let Some(level) = level {
            req = req.query(&[("level", level.as_str())]);
        }
        Ok(self.enveloped(path, req).await?.unwrap_or_default())
    }
}
