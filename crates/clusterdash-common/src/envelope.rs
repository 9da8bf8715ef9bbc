use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status value of a successful envelope.
pub const ENVELOPE_OK: &str = "ok";

/// `{status, message, data}` wrapper used by collection and boolean endpoints.
///
/// `data` is decoded strictly as `T`; a payload of the wrong shape fails the
/// whole body rather than being carried around untyped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

impl<T> Envelope<T> {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some(ENVELOPE_OK)
    }

    /// Unwrap the payload, failing when `status` is anything but `"ok"`.
    ///
    /// A successful envelope may still carry no data; callers decide whether
    /// that means "empty" or is an error for their endpoint.
    pub fn into_data(self) -> Result<Option<T>, EnvelopeError> {
        if self.is_ok() {
            return Ok(self.data);
        }
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .or(self.status)
            .unwrap_or_else(|| "missing envelope status".to_string());
        Err(EnvelopeError::Rejected(message))
    }
}
