//! OpenAI-compatible chat completions, as served by Groq.
//!
//! The transcript is sent as-is: system, user and assistant roles are all native.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use futures::stream::StreamExt;
use reqwest::Client as ReqwestClient;
use reqwest::header::{self, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{CompletionBackend, FragmentStream};
use crate::client_logger::CompletionLogger;
use crate::sse::process_sse;
use crate::types::{GenerationParams, KnownModel, Message, Model};
use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";

/// Environment variable holding the Groq API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Model used when none is configured.
pub fn default_model() -> Model {
    Model::Known(KnownModel::Llama3370bVersatile)
}

/// Request body for `POST chat/completions`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Model identifier.
    pub model: String,
    /// The full transcript in conversation order.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output length cap.
    pub max_tokens: u32,
    /// Always true.
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Builds a streaming request for `transcript`.
    pub fn new(transcript: &[Message], params: &GenerationParams) -> Self {
        Self {
            model: params.model.to_string(),
            messages: transcript.to_vec(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stream: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// What one `data:` payload means for the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChunkOutcome {
    Fragment(String),
    Skip,
    Done,
}

fn decode_chunk(data: &str) -> Result<ChunkOutcome> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(ChunkOutcome::Done);
    }
    if data.is_empty() {
        return Ok(ChunkOutcome::Skip);
    }
    let value: serde_json::Value = serde_json::from_str(data)?;
    if let Some(err) = super::error_in_payload(&value) {
        return Err(err);
    }
    let chunk: ChatCompletionChunk = serde_json::from_value(value)?;
    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
    {
        Some(content) if !content.is_empty() => Ok(ChunkOutcome::Fragment(content)),
        _ => Ok(ChunkOutcome::Skip),
    }
}

/// Client for Groq's OpenAI-compatible API.
#[derive(Clone)]
pub struct Groq {
    api_key: Option<String>,
    client: ReqwestClient,
    base_url: Url,
    logger: Option<Arc<dyn CompletionLogger>>,
}

impl Groq {
    /// Create a new Groq client.
    ///
    /// The API key can be provided directly or read from the GROQ_API_KEY environment
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
}

#[async_trait::async_trait]
impl CompletionBackend for Groq {
    fn name(&self) -> &'static str {
        "Groq"
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
        let body = ChatCompletionRequest::new(transcript, params);
        if let Some(logger) = &self.logger {
            logger.log_request(self.name(), &serde_json::to_value(&body)?);
        }

        let url = self.base_url.join("chat/completions")?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::authentication(format!("{API_KEY_VAR} contains invalid characters")))?;
        let request = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, bearer)
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(&body);
        let response = super::send_request(request).await?;

        let logger = self.logger.clone();
        let fragments = process_sse(response.bytes_stream())
            .map(|event| event.and_then(|event| decode_chunk(&event.data)))
            .take_while(|outcome| future::ready(!matches!(outcome, Ok(ChunkOutcome::Done))))
            .filter_map(move |outcome| {
                future::ready(match outcome {
                    Ok(ChunkOutcome::Fragment(text)) => {
                        if let Some(logger) = &logger {
                            logger.log_fragment(&text);
                        }
                        Some(Ok(text))
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            });
        Ok(super::fragment_stream(fragments))
    }
}
