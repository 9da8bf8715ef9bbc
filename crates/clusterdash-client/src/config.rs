use std::time::Duration;

use clap::Parser;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Whole-request limit for ordinary (non-streaming) calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum silence between two reads on an open connection.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);
/// Whole-request limit for chat and generate calls, streaming or not.
pub const STREAM_TIMEOUT: Duration = Duration::from_secs(600);
pub const POOL_MAX_IDLE_PER_HOST: usize = 8;
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(name = "clusterdash")]
pub struct ClientConfig {
    /// Cluster backend URL
    #[arg(long, env = "CLUSTERDASH_API_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Read the configuration from the environment only, ignoring process arguments.
    pub fn from_env() -> Self {
        Self::parse_from([env!("CARGO_PKG_NAME")])
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
