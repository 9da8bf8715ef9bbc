use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

impl NodeStatus {
    pub fn is_online(self) -> bool {
        matches!(self, NodeStatus::Online)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HardwareInfo {
    pub cpu: Option<String>,
    pub gpu: Option<String>,
    pub memory: Option<String>,
}

/// One compute host of the cluster.
///
/// Returned by `GET api/nodes` and `GET api/nodes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Node {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<NodeStatus>,

    /// Number of models currently loaded on the node.
    pub model_count: Option<u32>,

    pub hardware: Option<HardwareInfo>,
}

impl Node {
    /// Name to show for the node, falling back to its id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("unknown")
    }

    pub fn is_online(&self) -> bool {
        self.status.is_some_and(NodeStatus::is_online)
    }
}
