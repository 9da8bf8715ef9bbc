pub mod admin;
pub mod chat;
pub mod cluster;
pub mod envelope;
pub mod generate;
pub mod model;
pub mod node;
pub mod queue;

mod de;

pub use admin::{LogEntry, LogLevel, MetricsData, SystemInfo};
pub use chat::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use cluster::ClusterStatus;
pub use envelope::{Envelope, EnvelopeError, ENVELOPE_OK};
pub use generate::{GenerateRequest, GenerateResponse, GenerationParameters};
pub use model::{Model, ModelDetails, ModelStatus};
pub use node::{HardwareInfo, Node, NodeStatus};
pub use queue::QueueStatus;

pub mod telemetry;
