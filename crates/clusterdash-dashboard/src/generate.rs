use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use clusterdash_client::repository::LlmRepository;
use clusterdash_client::ClientError;
use clusterdash_common::{GenerateRequest, GenerationParameters, TokenUsage};

use crate::chat::NO_MODEL_SELECTED;
use crate::observable::Observable;
use crate::parameters::ParameterUpdate;
use crate::phase::InteractionPhase;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateState {
    pub prompt: String,
    /// Text generated for the last prompt, grown fragment by fragment.
    pub output: String,
    pub node_id: Option<String>,
    pub model: Option<String>,
    pub streaming: bool,
    pub parameters: GenerationParameters,
    pub phase: InteractionPhase,
    pub error: Option<String>,
    pub last_usage: Option<TokenUsage>,
}

impl Default for GenerateState {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            output: String::new(),
            node_id: None,
            model: None,
            streaming: true,
            parameters: GenerationParameters::default(),
            phase: InteractionPhase::Idle,
            error: None,
            last_usage: None,
        }
    }
}

/// Text generation screen: drives `api/generate`.
pub struct GenerateViewModel {
    llm: Arc<dyn LlmRepository>,
    state: Observable<GenerateState>,
    lifetime: CancellationToken,
    inflight: Mutex<Option<CancellationToken>>,
}

impl GenerateViewModel {
    pub fn new(llm: Arc<dyn LlmRepository>) -> Self {
        Self {
            llm,
            state: Observable::new(GenerateState::default()),
            lifetime: CancellationToken::new(),
            inflight: Mutex::new(None),
        }
    }

    pub fn state(&self) -> &Observable<GenerateState> {
        &self.state
    }

    pub fn select_target(&self, node_id: Option<String>, model: impl Into<String>) {
        let model = model.into();
        self.state.update(|s| {
            s.node_id = node_id;
            s.model = Some(model);
        });
    }

    pub fn set_streaming(&self, streaming: bool) {
        self.state.update(|s| s.streaming = streaming);
    }

    pub fn update_parameters(&self, update: ParameterUpdate) {
        self.state.update(|s| update.apply(&mut s.parameters));
    }

    pub fn clear_output(&self) -> bool {
        self.state.update_if(|s| {
            if s.phase.is_busy() {
                return false;
            }
            s.output.clear();
            s.error = None;
            true
        })
    }

    pub fn cancel(&self) {
        if let Some(token) = self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }

    pub fn dispose(&self) {
        self.lifetime.cancel();
    }

    /// Generate text for `prompt`, replacing the previous output.
    ///
    /// Streamed fragments are deltas and are appended to the output in order.
    pub async fn generate(&self, prompt: impl Into<String>) -> bool {
        let prompt = prompt.into();
        if prompt.trim().is_empty() || self.lifetime.is_cancelled() {
            return false;
        }

        let mut request = None;
        self.state.update_if(|s| {
            if s.phase.is_busy() {
                return false;
            }
            let Some(model) = s.model.clone() else {
                s.error = Some(NO_MODEL_SELECTED.to_string());
                return true;
            };
            s.prompt = prompt.clone();
            s.output.clear();
            s.phase = InteractionPhase::Sending;
            s.error = None;
            request = Some(GenerateRequest {
                node_id: s.node_id.clone(),
                model,
                prompt,
                stream: s.streaming,
                parameters: (!s.parameters.is_empty()).then(|| s.parameters.clone()),
            });
            true
        });
        let Some(request) = request else {
            return false;
        };

        let _idle = self.state.reset_on_drop(|s| s.phase = InteractionPhase::Idle);
        let token = self.lifetime.child_token();
        *self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        let span =
            tracing::info_span!("generate", request_id = %Uuid::new_v4(), model = %request.model);
        let result = async {
            if request.stream {
                self.stream_output(&request, &token).await
            } else {
                self.fetch_output(&request, &token).await
            }
        }
        .instrument(span)
        .await;

        if let Err(e) = result {
            tracing::error!(error = %e, "generate failed");
            self.state.update(|s| s.error = Some(e.to_string()));
        }
        true
    }

    async fn stream_output(
        &self,
        request: &GenerateRequest,
        token: &CancellationToken,
    ) -> Result<(), ClientError> {
        let mut stream = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            opened = self.llm.generate_stream(request) => opened?,
        };
        self.state.update(|s| s.phase = InteractionPhase::Streaming);

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::info!("generate stream cancelled");
                    return Ok(());
                }
                next = stream.next() => next,
            };
            let Some(fragment) = next else { break };
            let fragment = fragment?;
            self.state.update(|s| {
                if let Some(text) = &fragment.text {
                    s.output.push_str(text);
                }
                if fragment.usage.is_some() {
                    s.last_usage = fragment.usage;
                }
            });
        }
        Ok(())
    }

    async fn fetch_output(
        &self,
        request: &GenerateRequest,
        token: &CancellationToken,
    ) -> Result<(), ClientError> {
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            response = self.llm.generate(request) => response?,
        };
        self.state.update(|s| {
            s.output = response.text.unwrap_or_default();
            if response.usage.is_some() {
                s.last_usage = response.usage;
            }
        });
        Ok(())
    }
}

impl Drop for GenerateViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}
