use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use clusterdash_client::repository::LlmRepository;
use clusterdash_client::ClientError;
use clusterdash_common::{ChatMessage, ChatRequest, GenerationParameters, Role, TokenUsage};

use crate::observable::Observable;
use crate::parameters::ParameterUpdate;
use crate::phase::InteractionPhase;

pub(crate) const NO_MODEL_SELECTED: &str = "Select a model before sending";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    /// Conversation so far. Only the trailing assistant reply is ever edited.
    pub messages: Vec<ChatMessage>,
    pub node_id: Option<String>,
    pub model: Option<String>,
    pub streaming: bool,
    pub parameters: GenerationParameters,
    pub phase: InteractionPhase,
    pub error: Option<String>,
    pub last_usage: Option<TokenUsage>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
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

enum Admission {
    Busy,
    NoModel,
    /// Request to send, and the transcript slot of the streaming placeholder.
    Accepted(ChatRequest, Option<usize>),
}

/// Chat screen: owns the transcript and drives `api/chat`.
pub struct ChatViewModel {
    llm: Arc<dyn LlmRepository>,
    state: Observable<ChatState>,
    lifetime: CancellationToken,
    inflight: Mutex<Option<CancellationToken>>,
}

impl ChatViewModel {
    pub fn new(llm: Arc<dyn LlmRepository>) -> Self {
        Self {
            llm,
            state: Observable::new(ChatState::default()),
            lifetime: CancellationToken::new(),
            inflight: Mutex::new(None),
        }
    }

    pub fn state(&self) -> &Observable<ChatState> {
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

    /// Set the system prompt, replacing an existing one at the head of the transcript.
    pub fn set_system_prompt(&self, prompt: impl Into<String>) -> bool {
        let prompt = prompt.into();
        self.state.update_if(|s| {
            if s.phase.is_busy() {
                return false;
            }
            match s.messages.first_mut() {
                Some(first) if first.role == Role::System => first.content = prompt,
                _ => s.messages.insert(0, ChatMessage::system(prompt)),
            }
            true
        })
    }

    /// Empty the transcript. Refused while a send is in flight.
    pub fn clear_transcript(&self) -> bool {
        self.state.update_if(|s| {
            if s.phase.is_busy() {
                return false;
            }
            s.messages.clear();
            s.error = None;
            s.last_usage = None;
            true
        })
    }

    /// Abort the in-flight send, keeping whatever text already arrived.
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

    /// Cancel everything this screen started. Also runs on drop.
    pub fn dispose(&self) {
        self.lifetime.cancel();
    }

    /// Append a user message and request the assistant's reply.
    ///
    /// Returns false without touching the transcript when the text is blank,
    /// no model is selected, or another send is still in flight.
    pub async fn send_message(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text.trim().is_empty() || self.lifetime.is_cancelled() {
            return false;
        }

        let mut admission = Admission::Busy;
        self.state.update_if(|s| {
            if s.phase.is_busy() {
                return false;
            }
            let Some(model) = s.model.clone() else {
                s.error = Some(NO_MODEL_SELECTED.to_string());
                admission = Admission::NoModel;
                return true;
            };

            s.messages.push(ChatMessage::user(text));
            s.phase = InteractionPhase::Sending;
            s.error = None;

            let request = ChatRequest {
                node_id: s.node_id.clone(),
                model,
                messages: s.messages.clone(),
                stream: s.streaming,
                parameters: (!s.parameters.is_empty()).then(|| s.parameters.clone()),
            };
            let slot = s.streaming.then(|| {
                s.messages.push(ChatMessage::assistant(""));
                s.messages.len() - 1
            });
            admission = Admission::Accepted(request, slot);
            true
        });

        let (request, slot) = match admission {
            Admission::Accepted(request, slot) => (request, slot),
            Admission::Busy => {
                tracing::debug!("chat send ignored, previous send still in flight");
                return false;
            }
            Admission::NoModel => return false,
        };

        let _idle = self.state.reset_on_drop(|s| s.phase = InteractionPhase::Idle);
        let token = self.begin_operation();
        let span = tracing::info_span!("chat", request_id = %Uuid::new_v4(), model = %request.model);

        let result = async {
            match slot {
                Some(slot) => self.stream_reply(&request, slot, &token).await,
                None => self.fetch_reply(&request, &token).await,
            }
        }
        .instrument(span)
        .await;

        let cancelled = token.is_cancelled();
        if let Err(e) = &result {
            tracing::error!(error = %e, "chat failed");
        }
        self.state.update(|s| {
            if let Err(e) = &result {
                s.error = Some(e.to_string());
            }
            if result.is_err() || cancelled {
                drop_empty_placeholder(&mut s.messages, slot);
            }
        });
        true
    }

    fn begin_operation(&self) -> CancellationToken {
        let token = self.lifetime.child_token();
        *self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        token
    }

    /// Each fragment carries the whole reply so far and replaces the placeholder.
    async fn stream_reply(
        &self,
        request: &ChatRequest,
        slot: usize,
        token: &CancellationToken,
    ) -> Result<(), ClientError> {
        let mut stream = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            opened = self.llm.chat_stream(request) => opened?,
        };
        self.state.update(|s| s.phase = InteractionPhase::Streaming);

        let mut fragments = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::info!(fragments, "chat stream cancelled");
                    return Ok(());
                }
                next = stream.next() => next,
            };
            let Some(fragment) = next else { break };
            let fragment = fragment?;
            fragments += 1;

            self.state.update(|s| {
                if let (Some(message), Some(target)) = (fragment.message, s.messages.get_mut(slot)) {
                    target.content = message.content;
                }
                if fragment.usage.is_some() {
                    s.last_usage = fragment.usage;
                }
            });
        }
        tracing::debug!(fragments, "chat stream finished");
        Ok(())
    }

    async fn fetch_reply(
        &self,
        request: &ChatRequest,
        token: &CancellationToken,
    ) -> Result<(), ClientError> {
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            response = self.llm.chat(request) => response?,
        };
        let content = response.message.map(|m| m.content).unwrap_or_default();
        self.state.update(|s| {
            s.messages.push(ChatMessage::assistant(content));
            if response.usage.is_some() {
                s.last_usage = response.usage;
            }
        });
        Ok(())
    }
}

impl Drop for ChatViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn drop_empty_placeholder(messages: &mut Vec<ChatMessage>, slot: Option<usize>) {
    let Some(slot) = slot else { return };
    let empty = messages
        .get(slot)
        .is_some_and(|m| m.role == Role::Assistant && m.content.is_empty());
    if empty {
        messages.remove(slot);
    }
}
