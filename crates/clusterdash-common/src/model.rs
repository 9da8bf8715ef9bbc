use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Loaded,
    Loading,
    Unloaded,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ModelDetails {
    /// Human readable size, e.g. "7B".
    pub parameter_count: Option<String>,
    pub context_length: Option<u64>,
    pub model_type: Option<String>,
}

/// A model exposed by a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Model {
    pub id: Option<String>,
    pub name: Option<String>,

    /// Node that owns this model.
    pub node_id: Option<String>,

    pub status: Option<ModelStatus>,
    pub details: Option<ModelDetails>,
}

impl Model {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("unknown")
    }

    pub fn is_loaded(&self) -> bool {
        self.status == Some(ModelStatus::Loaded)
    }
}
