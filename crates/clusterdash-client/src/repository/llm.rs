use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;

use clusterdash_common::{ChatRequest, ChatResponse, GenerateRequest, GenerateResponse};

use super::{logged, LlmRepository};
use crate::{ApiClient, FragmentStream, Result};

pub struct HttpLlmRepository {
    api: Arc<ApiClient>,
}

impl HttpLlmRepository {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

/// Log a stream that dies midway; the error itself still reaches the subscriber.
fn log_stream_failure<T: Send + 'static>(
    operation: &'static str,
    stream: FragmentStream<T>,
) -> FragmentStream<T> {
    Box::pin(stream.inspect(move |item| {
        if let Err(e) = item {
            tracing::error!(operation, error = %e, "stream interrupted");
        }
    }))
}

#[async_trait]
impl LlmRepository for HttpLlmRepository {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        tracing::debug!(
            model = %request.model,
            node_id = ?request.node_id,
            messages = request.messages.len(),
            "sending chat"
        );
        logged("chat", self.api.chat(request).await)
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream<ChatResponse>> {
        tracing::debug!(
            model = %request.model,
            node_id = ?request.node_id,
            messages = request.messages.len(),
            "opening chat stream"
        );
        logged("chat_stream", self.api.chat_stream(request).await)
            .map(|s| log_stream_failure("chat_stream", s))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        tracing::debug!(
            model = %request.model,
            node_id = ?request.node_id,
            prompt_len = request.prompt.len(),
            "sending generate"
        );
        logged("generate", self.api.generate(request).await)
    }

    async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> Result<FragmentStream<GenerateResponse>> {
        tracing::debug!(
            model = %request.model,
            node_id = ?request.node_id,
            prompt_len = request.prompt.len(),
            "opening generate stream"
        );
        logged("generate_stream", self.api.generate_stream(request).await)
            .map(|s| log_stream_failure("generate_stream", s))
    }
}
