use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a hosted model identifier.
///
/// This can be a predefined model or a custom string value for models that are not
/// listed here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier
    Custom(String),
}

/// Known hosted models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Llama 3.3 70B Versatile on Groq
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama3370bVersatile,

    /// Llama 3.1 8B Instant on Groq
    #[serde(rename = "llama-3.1-8b-instant")]
    Llama318bInstant,

    /// Gemini 2.0 Flash
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,

    /// Gemini 1.5 Flash
    #[serde(rename = "gemini-1.5-flash")]
    Gemini15Flash,

    /// Gemini 1.5 Pro
    #[serde(rename = "gemini-1.5-pro")]
    Gemini15Pro,
}

impl KnownModel {
    const ALL: [KnownModel; 5] = [
        KnownModel::Llama3370bVersatile,
        KnownModel::Llama318bInstant,
        KnownModel::Gemini20Flash,
        KnownModel::Gemini15Flash,
        KnownModel::Gemini15Pro,
    ];

    /// The identifier sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            KnownModel::Llama3370bVersatile => "llama-3.3-70b-versatile",
            KnownModel::Llama318bInstant => "llama-3.1-8b-instant",
            KnownModel::Gemini20Flash => "gemini-2.0-flash",
            KnownModel::Gemini15Flash => "gemini-1.5-flash",
            KnownModel::Gemini15Pro => "gemini-1.5-pro",
        }
    }
}

impl Model {
    /// The identifier sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Model::Known(known) => known.as_str(),
            Model::Custom(custom) => custom,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(KnownModel::ALL
            .into_iter()
            .find(|known| known.as_str() == s)
            .map(Model::Known)
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_serialization() {
        let model = Model::Known(KnownModel::Llama3370bVersatile);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""llama-3.3-70b-versatile""#);
    }

    #[test]
    fn custom_model_serialization() {
        let model = Model::Custom("mixtral-8x7b-32768".to_string());
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""mixtral-8x7b-32768""#);
    }

    #[test]
    fn model_deserialization() {
        let model: Model = serde_json::from_str(r#""gemini-2.0-flash""#).unwrap();
        assert_eq!(model, Model::Known(KnownModel::Gemini20Flash));

        let model: Model = serde_json::from_str(r#""some-new-model""#).unwrap();
        assert_eq!(model, Model::Custom("some-new-model".to_string()));
    }

    #[test]
    fn parse_prefers_known_models() {
        let model: Model = "llama-3.1-8b-instant".parse().unwrap();
        assert_eq!(model, Model::Known(KnownModel::Llama318bInstant));

        let model: Model = " qwen-qwq-32b ".parse().unwrap();
        assert_eq!(model, Model::Custom("qwen-qwq-32b".to_string()));
    }

    #[test]
    fn display() {
        assert_eq!(
            Model::Known(KnownModel::Gemini15Pro).to_string(),
            "gemini-1.5-pro"
        );
        assert_eq!(Model::Custom("x".to_string()).to_string(), "x");
    }
}
