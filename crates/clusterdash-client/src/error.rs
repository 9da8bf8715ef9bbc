use clusterdash_common::EnvelopeError;
use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused/reset, timeout, or a body read that failed midway.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request to {endpoint} failed with HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    /// The HTTP call succeeded but the envelope status was not "ok".
    #[error("{endpoint}: {message}")]
    Rejected { endpoint: String, message: String },

    #[error("{endpoint}: response envelope carried no data")]
    MissingData { endpoint: String },

    #[error("{endpoint}: failed to decode response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub(crate) fn rejected(endpoint: &str, err: EnvelopeError) -> Self {
        let EnvelopeError::Rejected(message) = err;
        ClientError::Rejected {
            endpoint: endpoint.to_string(),
            message,
        }
    }

    /// HTTP status of a protocol failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
