use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::de::null_as_default;
use crate::NodeStatus;

/// Aggregate view of the cluster returned by `GET api/cluster/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClusterStatus {
    pub total_nodes: Option<u32>,
    pub online_nodes: Option<u32>,
    pub total_models: Option<u32>,
    pub loaded_models: Option<u32>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub node_status: HashMap<String, NodeStatus>,

    /// Pending requests per node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub queue_sizes: HashMap<String, u64>,

    /// Model names available on each node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub available_models: HashMap<String, Vec<String>>,
}

impl ClusterStatus {
    pub fn total_queued(&self) -> u64 {
        self.queue_sizes.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_null_maps_are_empty() {
        let status: ClusterStatus =
            serde_json::from_str(r#"{"total_nodes":3,"node_status":null}"#).unwrap();
        assert_eq!(status.total_nodes, Some(3));
        assert!(status.node_status.is_empty());
        assert!(status.queue_sizes.is_empty());
        assert!(status.available_models.is_empty());
        assert_eq!(status.total_queued(), 0);
    }

    #[test]
    fn test_cluster_maps() {
        let status: ClusterStatus = serde_json::from_str(
            r#"{"node_status":{"n1":"online","n2":"offline"},
                "queue_sizes":{"n1":4,"n2":1},
                "available_models":{"n1":["llama3","mistral"]}}"#,
        )
        .unwrap();
        assert_eq!(status.node_status["n2"], NodeStatus::Offline);
        assert_eq!(status.total_queued(), 5);
        assert_eq!(status.available_models["n1"].len(), 2);
    }
}
