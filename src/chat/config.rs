//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::backend::BackendKind;
use crate::session::HistoryPolicy;
use crate::types::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationParams, Model, Personality};
use crate::{Error, Result};

/// Highest accepted sampling temperature.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Command-line arguments for the gamechat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Which hosted API to talk to.
    #[arrrg(optional, "Backend: groq or gemini (default: groq)", "BACKEND")]
    pub backend: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default depends on backend)", "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature 0.0-2.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 1024)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Starting personality.
    #[arrrg(optional, "Personality: friendly, professional, humorous", "NAME")]
    pub personality: Option<String>,

    /// Keep prior turns when the personality changes.
    #[arrrg(flag, "Keep chat history when switching personality")]
    pub keep_history: bool,

    /// Override the API base URL.
    #[arrrg(optional, "Override the backend's base URL", "URL")]
    pub base_url: Option<String>,

    /// Append request/response records to this file.
    #[arrrg(optional, "Write JSON-lines traffic log to FILE", "FILE")]
    pub log_file: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The backend family.
    pub backend: BackendKind,

    /// The model to use for generating responses.
    pub model: Model,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens per response.
    pub max_tokens: u32,

    /// Personality at startup.
    pub personality: Personality,

    /// What a personality change does to history.
    pub history_policy: HistoryPolicy,

    /// Base URL override for the backend.
    pub base_url: Option<String>,

    /// Path of the JSON-lines traffic log, if any.
    pub log_file: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Backend: groq
    /// - Model: llama-3.3-70b-versatile
    /// - Temperature: 0.7
    /// - Max tokens: 1024
    /// - Personality: Friendly
    /// - History: reset on personality change
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            backend: BackendKind::Groq,
            model: BackendKind::Groq.default_model(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            personality: Personality::default(),
            history_policy: HistoryPolicy::default(),
            base_url: None,
            log_file: None,
            use_color: true,
        }
    }

    /// Sets the backend and switches the model to that backend's default.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self.model = backend.default_model();
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the starting personality.
    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    /// Sets the history policy.
    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }

    /// Sets the base URL override.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the traffic log path.
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The generation parameters sent with every request.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams::new(self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let mut config = ChatConfig::new();

        if let Some(backend) = args.backend {
            let backend = backend
                .parse::<BackendKind>()
                .map_err(|err| Error::validation(err, Some("backend".to_string())))?;
            config = config.with_backend(backend);
        }
        if let Some(model) = args.model {
            let model = model.parse::<Model>().unwrap_or(Model::Custom(model));
            config = config.with_model(model);
        }
        if let Some(temperature) = args.temperature {
            config = config.with_temperature(parse_temperature(&temperature)?);
        }
        if let Some(max_tokens) = args.max_tokens {
            if max_tokens == 0 {
                return Err(Error::validation(
                    "max tokens must be positive",
                    Some("max-tokens".to_string()),
                ));
            }
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(personality) = args.personality {
            let personality = personality
                .parse::<Personality>()
                .map_err(|err| Error::validation(err, Some("personality".to_string())))?;
            config = config.with_personality(personality);
        }
        if args.keep_history {
            config = config.with_history_policy(HistoryPolicy::PreserveOnChange);
        }
        config = config
            .with_base_url(args.base_url)
            .with_log_file(args.log_file.map(PathBuf::from));
        if args.no_color {
            config = config.without_color();
        }
        Ok(config)
    }
}

fn parse_temperature(value: &str) -> Result<f32> {
    let invalid = || {
        Error::validation(
            format!("temperature expects a value between 0 and {MAX_TEMPERATURE}"),
            Some("temperature".to_string()),
        )
    };
    let parsed: f32 = value.trim().parse().map_err(|_| invalid())?;
    if parsed.is_finite() && (0.0..=MAX_TEMPERATURE).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.backend, BackendKind::Groq);
        assert_eq!(config.model, Model::Known(KnownModel::Llama3370bVersatile));
        assert_eq!(config.max_tokens, 1024);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.personality, Personality::Friendly);
        assert_eq!(config.history_policy, HistoryPolicy::ResetOnChange);
        assert!(config.use_color);
        assert!(config.base_url.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::try_from(ChatArgs::default()).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            backend: Some("gemini".to_string()),
            model: None,
            temperature: Some("0.2".to_string()),
            max_tokens: Some(512),
            personality: Some("humorous".to_string()),
            keep_history: true,
            base_url: Some("http://localhost:9000/".to_string()),
            log_file: Some("chat.jsonl".to_string()),
            no_color: true,
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.backend, BackendKind::Gemini);
        assert_eq!(config.model, Model::Known(KnownModel::Gemini20Flash));
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.personality, Personality::Humorous);
        assert_eq!(config.history_policy, HistoryPolicy::PreserveOnChange);
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000/"));
        assert_eq!(config.log_file, Some(PathBuf::from("chat.jsonl")));
        assert!(!config.use_color);
    }

    #[test]
    fn explicit_model_wins_over_backend_default() {
        let args = ChatArgs {
            backend: Some("groq".to_string()),
            model: Some("llama-3.1-8b-instant".to_string()),
            ..ChatArgs::default()
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.model, Model::Known(KnownModel::Llama318bInstant));
    }

    #[test]
    fn invalid_args_are_rejected() {
        let bad_temp = ChatArgs {
            temperature: Some("3.5".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(bad_temp).unwrap_err().is_validation());

        let bad_backend = ChatArgs {
            backend: Some("openai".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(bad_backend).is_err());

        let bad_personality = ChatArgs {
            personality: Some("grumpy".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(bad_personality).is_err());

        let zero_tokens = ChatArgs {
            max_tokens: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(zero_tokens).is_err());
    }

    #[test]
    fn generation_params_follow_config() {
        let params = ChatConfig::new()
            .with_temperature(0.0)
            .with_max_tokens(64)
            .generation_params();
        assert_eq!(params.model, Model::Known(KnownModel::Llama3370bVersatile));
        assert_eq!(params.temperature, 0.0);
        assert_eq!(params.max_tokens, 64);
    }
}
