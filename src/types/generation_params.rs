use serde::{Deserialize, Serialize};

use crate::types::Model;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default cap on response length.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Fixed per-request generation settings shared by every backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Which hosted model answers.
    pub model: Model,

    /// Sampling randomness; 0 is deterministic.
    pub temperature: f32,

    /// Hard cap on output tokens.
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Creates parameters for `model` with default sampling settings.
    pub fn new(model: impl Into<Model>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
