use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::de::null_as_default;

/// Usage counters from `GET admin/metrics`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetricsData {
    pub timestamp: Option<DateTime<Utc>>,

    /// Percentages (0.0 - 100.0).
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub gpu_usage: Option<f64>,

    pub total_requests: Option<u64>,
    pub failed_requests: Option<u64>,
    pub requests_per_minute: Option<f64>,
    pub average_latency_ms: Option<f64>,
    pub tokens_generated: Option<u64>,
    pub active_connections: Option<u64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub requests_by_node: HashMap<String, u64>,
}

impl MetricsData {
    /// Fraction of failed requests, `None` until a request has been served.
    pub fn error_rate(&self) -> Option<f64> {
        let total = self.total_requests.filter(|t| *t > 0)?;
        Some(self.failed_requests.unwrap_or(0) as f64 / total as f64)
    }
}

/// Backend host description from `GET admin/system`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SystemInfo {
    pub version: Option<String>,
    pub hostname: Option<String>,
    pub os: Option<String>,
    pub cpu_count: Option<u32>,
    pub total_memory: Option<String>,
    pub uptime_seconds: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One backend log line. `level` stays a string: backends emit levels
/// (`critical`, `trace`, ...) beyond the ones the filter knows about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LogEntry {
    pub timestamp: Option<DateTime<Utc>>,
    pub level: Option<String>,
    pub source: Option<String>,
    pub message: Option<String>,
}
