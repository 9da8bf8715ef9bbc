use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of the backend request queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QueueStatus {
    /// False while the queue is paused.
    pub active: Option<bool>,
    pub pending: Option<u64>,
    pub processing: Option<u64>,
    pub completed: Option<u64>,
}
