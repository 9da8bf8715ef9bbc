//! HTTP client for the cluster backend: typed endpoints, the line-oriented
//! event-stream decoder, and one repository per resource area.

pub mod api;
pub mod config;
pub mod error;
pub mod repository;
pub mod sse;

pub use api::{ApiClient, FragmentStream};
pub use config::ClientConfig;
pub use error::ClientError;
pub use sse::SentinelPolicy;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
