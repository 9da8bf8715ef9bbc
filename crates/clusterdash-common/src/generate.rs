use serde::{Deserialize, Serialize};

use crate::TokenUsage;

/// Sampling options forwarded to the backend.
///
/// Every field is optional; unset fields are left out of the request so the
/// backend applies its own defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GenerationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerationParameters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of `POST api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<GenerationParameters>,
}

/// Generated text; in streaming mode a delta to append to earlier fragments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GenerateResponse {
    pub text: Option<String>,
    pub usage: Option<TokenUsage>,
    pub model: Option<String>,
    pub done: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_serialize_only_set_fields() {
        let params = GenerationParameters {
            temperature: Some(0.2),
            stop: Some(vec!["\n\n".to_string()]),
            ..Default::default()
        };
        let v = serde_json::to_value(&params).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("temperature"));
        assert!(obj.contains_key("stop"));
        assert!(!params.is_empty());
        assert!(GenerationParameters::default().is_empty());
    }
}
