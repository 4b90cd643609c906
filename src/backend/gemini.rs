//! Google Gemini `streamGenerateContent`.
//!
//! Gemini chats have no system role.  [`GeminiChat::from_transcript`] folds the system
//! prompt into the first user message, renames `assistant` to `model`, and splits the
//! conversation into prior history plus the turn being sent.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client as ReqwestClient;
use reqwest::header::{self, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{CompletionBackend, FragmentStream};
use crate::client_logger::CompletionLogger;
use crate::sse::process_sse;
use crate::types::{GenerationParams, KnownModel, Message, Model, Role};
use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Environment variable holding the Gemini API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Model used when none is configured.
pub fn default_model() -> Model {
    Model::Known(KnownModel::Gemini20Flash)
}

/// Gemini's name for the user role.
pub const USER_ROLE: &str = "user";

/// Gemini's name for the assistant role.
pub const MODEL_ROLE: &str = "model";

/// One text part of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Part text.
    pub text: String,
}

/// One turn in Gemini's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`.
    pub role: String,
    /// Text parts.
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// A transcript translated for Gemini: prior turns plus the message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiChat {
    /// Every turn before the last, oldest first.
    pub history: Vec<Content>,
    /// The final user message.
    pub turn: Content,
}

impl GeminiChat {
    /// Translates the transcript.
    ///
    /// # Errors
    ///
    /// Returns a validation error if there is nothing to send or the last message is not
    /// from the user.
    pub fn from_transcript(transcript: &[Message]) -> Result<Self> {
        let system = transcript
            .iter()
            .find(|message| message.role == Role::System)
            .map(|message| message.content.as_str());

        let mut prepended = system.is_none();
        let mut contents: Vec<Content> = Vec::with_capacity(transcript.len());
        for message in transcript {
            match message.role {
                Role::System => {}
                Role::User => {
                    let text = match system {
                        Some(system) if !prepended => {
                            prepended = true;
                            format!("{system}\n\nUser: {}", message.content)
                        }
                        _ => message.content.clone(),
                    };
                    contents.push(Content::text(USER_ROLE, text));
                }
                Role::Assistant => contents.push(Content::text(MODEL_ROLE, &message.content)),
            }
        }

        let Some(turn) = contents.pop() else {
            return Err(Error::validation(
                "transcript has no user message to send",
                Some("messages".to_string()),
            ));
        };
        if turn.role != USER_ROLE {
            return Err(Error::validation(
                "the last message must come from the user",
                Some("messages".to_string()),
            ));
        }
        Ok(Self {
            history: contents,
            turn,
        })
    }
}

/// Sampling settings in Gemini's shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Output length cap.
    pub max_output_tokens: u32,
}

/// Request body for `streamGenerateContent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// History followed by the new turn.
    pub contents: Vec<Content>,
    /// Sampling settings.
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Builds the request for a translated chat.
    pub fn new(chat: GeminiChat, params: &GenerationParams) -> Self {
        let GeminiChat { mut history, turn } = chat;
        history.push(turn);
        Self {
            contents: history,
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Decodes one `data:` payload into the text fragments it carries.
fn decode_chunk(data: &str) -> Result<Vec<String>> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let value: serde_json::Value = serde_json::from_str(data)?;
    if let Some(err) = super::error_in_payload(&value) {
        return Err(err);
    }
    let chunk: GenerateContentChunk = serde_json::from_value(value)?;
    Ok(chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .filter(|text| !text.is_empty())
                .collect()
        })
        .unwrap_or_default())
}

/// Client for the Gemini API.
#[derive(Clone)]
pub struct Gemini {
    api_key: Option<String>,
    client: ReqwestClient,
    base_url: Url,
    logger: Option<Arc<dyn CompletionLogger>>,
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the GEMINI_API_KEY environment
    /// variable.  No timeout is applied unless one is given.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.or_else(|| super::credential_from_env(API_KEY_VAR));
        let base_url = super::parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        Ok(Self {
            api_key,
            client: super::build_http_client(timeout)?,
            base_url,
            logger: None,
        })
    }

    /// Attaches a logger that sees every request body and fragment.
    pub fn with_logger(mut self, logger: Arc<dyn CompletionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    fn endpoint(&self, model: &Model) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("models/{model}:streamGenerateContent"))?;
        url.set_query(Some("alt=sse"));
        Ok(url)
    }
}

#[async_trait::async_trait]
impl CompletionBackend for Gemini {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn credential_name(&self) -> &'static str {
        API_KEY_VAR
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn stream_completion(
        &self,
        transcript: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| super::missing_credential(API_KEY_VAR))?;
        let chat = GeminiChat::from_transcript(transcript)?;
        let body = GenerateContentRequest::new(chat, params);
        if let Some(logger) = &self.logger {
            logger.log_request(self.name(), &serde_json::to_value(&body)?);
        }

        let key = HeaderValue::from_str(api_key).map_err(|_| {
            Error::authentication(format!("{API_KEY_VAR} contains invalid characters"))
        })?;
        let request = self
            .client
            .post(self.endpoint(&params.model)?)
            .header("x-goog-api-key", key)
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(&body);
        let response = super::send_request(request).await?;

        let logger = self.logger.clone();
        let fragments = process_sse(response.bytes_stream())
            .map(|event| event.and_then(|event| decode_chunk(&event.data)))
            .flat_map(|decoded| match decoded {
                Ok(texts) => stream::iter(texts.into_iter().map(Ok).collect::<Vec<_>>()),
                Err(e) => stream::iter(vec![Err(e)]),
            })
            .inspect(move |fragment| {
                if let (Some(logger), Ok(text)) = (&logger, fragment) {
                    logger.log_fragment(text);
                }
            });
        Ok(super::fragment_stream(fragments))
    }
}
