use clusterdash_common::GenerationParameters;

/// A partial change to the sampling parameters. Fields left `None` keep
/// their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterUpdate {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub frequency_penalty: Option<f32>,
}

impl ParameterUpdate {
    pub fn temperature(value: f32) -> Self {
        Self {
            temperature: Some(value),
            ..Default::default()
        }
    }

    pub fn top_p(value: f32) -> Self {
        Self {
            top_p: Some(value),
            ..Default::default()
        }
    }

    pub fn max_tokens(value: u32) -> Self {
        Self {
            max_tokens: Some(value),
            ..Default::default()
        }
    }

    pub fn frequency_penalty(value: f32) -> Self {
        Self {
            frequency_penalty: Some(value),
            ..Default::default()
        }
    }

    /// Apply the set fields, clamped to the ranges the backend accepts.
    pub fn apply(self, params: &mut GenerationParameters) {
        if let Some(v) = self.temperature {
            params.temperature = Some(v.clamp(0.0, 2.0));
        }
        if let Some(v) = self.top_p {
            params.top_p = Some(v.clamp(0.0, 1.0));
        }
        if let Some(v) = self.max_tokens {
            params.max_tokens = Some(v.max(1));
        }
        if let Some(v) = self.frequency_penalty {
            params.frequency_penalty = Some(v.clamp(-2.0, 2.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut params = GenerationParameters {
            temperature: Some(0.7),
            top_p: Some(0.9),
            max_tokens: Some(256),
            stop: Some(vec!["###".to_string()]),
            ..Default::default()
        };

        ParameterUpdate::top_p(0.5).apply(&mut params);

        assert_eq!(params.top_p, Some(0.5));
        assert_eq!(params.temperature, Some(0.7));
        assert_eq!(params.max_tokens, Some(256));
        assert_eq!(params.frequency_penalty, None);
        assert_eq!(params.stop.as_deref(), Some(&["###".to_string()][..]));
    }

    #[test]
    fn test_values_are_clamped() {
        let mut params = GenerationParameters::default();
        ParameterUpdate {
            temperature: Some(5.0),
            top_p: Some(-1.0),
            max_tokens: Some(0),
            frequency_penalty: Some(-3.0),
        }
        .apply(&mut params);

        assert_eq!(params.temperature, Some(2.0));
        assert_eq!(params.top_p, Some(0.0));
        assert_eq!(params.max_tokens, Some(1));
        assert_eq!(params.frequency_penalty, Some(-2.0));
    }
}
