//! Screen-level state holders for the cluster dashboard.
//!
//! Each view model is built with the repositories it needs, publishes its
//! state through an [`Observable`], and cancels its background work when
//! disposed or dropped. Rendering is left to whoever subscribes.

pub mod admin;
pub mod chat;
pub mod dashboard;
pub mod generate;
pub mod metrics;
pub mod observable;
pub mod parameters;
pub mod phase;
pub mod poller;

use std::time::Duration;

pub use admin::{AdminState, AdminViewModel};
pub use chat::{ChatState, ChatViewModel};
pub use dashboard::{DashboardState, DashboardViewModel, NodeDetail};
pub use generate::{GenerateState, GenerateViewModel};
pub use metrics::{MetricsState, MetricsViewModel};
pub use observable::Observable;
pub use parameters::ParameterUpdate;
pub use phase::InteractionPhase;
pub use poller::PollHandle;

/// Refresh period of the dashboard and metrics screens.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// No poll loop runs faster than this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Admin auto-refresh never runs faster than this.
pub const MIN_AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
