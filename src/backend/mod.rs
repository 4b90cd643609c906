//! Completion backends.
//!
//! A backend turns the transcript into the request shape one hosted API expects, issues a
//! streaming request, and yields the reply as text fragments.  Callers only ever see
//! [`CompletionBackend`] and [`FragmentStream`]; wire shapes stay inside each backend.

use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Deserialize;
use url::Url;

use crate::client_logger::CompletionLogger;
use crate::observability::{CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_ERRORS};
use crate::types::{GenerationParams, Message, Model};
use crate::{Error, Result};

pub mod gemini;
pub mod groq;

pub use gemini::Gemini;
pub use groq::Groq;

/// Incremental reply text.  Finite and consumed once; concatenating every `Ok` item in
/// order gives the complete reply.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A hosted model API that can continue a transcript.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short human-readable name.
    fn name(&self) -> &'static str;

    /// Environment variable holding this backend's credential.
    fn credential_name(&self) -> &'static str;

    /// Returns true if a credential was found at construction.
    fn has_credential(&self) -> bool;

    /// Sends `transcript` (system message already synchronized) and streams the reply.
    ///
    /// # Errors
    ///
    /// Fails before streaming if the credential is missing, the transcript cannot be
    /// translated, the request cannot be sent, or the API answers with an error status.
    /// Failures after the first fragment are yielded as `Err` items of the stream.
    async fn stream_completion(
        &self,
        transcript: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream>;
}

#[async_trait::async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn credential_name(&self) -> &'static str {
        (**self).credential_name()
    }

    fn has_credential(&self) -> bool {
        (**self).has_credential()
    }

    async fn stream_completion(
        &self,
        transcript: &[Message],
        params: &GenerationParams,
    ) -> Result<FragmentStream> {
        (**self).stream_completion(transcript, params).await
    }
}

/// The supported backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// OpenAI-compatible chat completions served by Groq.
    #[default]
    Groq,
    /// Google Gemini `streamGenerateContent`.
    Gemini,
}

impl BackendKind {
    /// Environment variable holding the credential.
    pub fn credential_name(self) -> &'static str {
        match self {
            BackendKind::Groq => groq::API_KEY_VAR,
            BackendKind::Gemini => gemini::API_KEY_VAR,
        }
    }

    /// Model used when none is configured.
    pub fn default_model(self) -> Model {
        match self {
            BackendKind::Groq => groq::default_model(),
            BackendKind::Gemini => gemini::default_model(),
        }
    }

    /// Builds the backend.
    ///
    /// `api_key` of `None` reads the credential from the environment; a missing
    /// credential is not an error here but makes every request fail.
    pub fn connect(
        self,
        api_key: Option<String>,
        base_url: Option<String>,
        logger: Option<Arc<dyn CompletionLogger>>,
    ) -> Result<Box<dyn CompletionBackend>> {
        Ok(match self {
            BackendKind::Groq => {
                let mut backend = Groq::with_options(api_key, base_url, None)?;
                if let Some(logger) = logger {
                    backend = backend.with_logger(logger);
                }
                Box::new(backend)
            }
            BackendKind::Gemini => {
                let mut backend = Gemini::with_options(api_key, base_url, None)?;
                if let Some(logger) = logger {
                    backend = backend.with_logger(logger);
                }
                Box::new(backend)
            }
        })
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Groq => write!(f, "groq"),
            BackendKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(BackendKind::Groq),
            "gemini" | "google" => Ok(BackendKind::Gemini),
            _ => Err(format!("Invalid backend: {s}. Valid options: groq, gemini")),
        }
    }
}

/// Boxes a backend's fragments, counting every error item as a stream error.
pub(crate) fn fragment_stream<S>(fragments: S) -> FragmentStream
where
    S: Stream<Item = Result<String>> + Send + 'static,
{
    Box::pin(fragments.inspect(|fragment| {
        if fragment.is_err() {
            STREAM_ERRORS.click();
        }
    }))
}

/// Reads a credential from the environment, treating an empty value as absent.
pub(crate) fn credential_from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

pub(crate) fn missing_credential(var: &str) -> Error {
    crate::observability::CLIENT_MISSING_CREDENTIAL.click();
    Error::authentication(format!("{var} is not set"))
}

/// Parses a base URL, making sure relative joins append rather than replace the last
/// path segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub(crate) fn build_http_client(timeout: Option<Duration>) -> Result<ReqwestClient> {
    let mut builder = ReqwestClient::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| {
        Error::http_client(
            format!("Failed to build HTTP client: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Sends a prepared request and maps transport failures and error statuses.
pub(crate) async fn send_request(request: RequestBuilder) -> Result<Response> {
    CLIENT_REQUESTS.click();
    let response = request.send().await.map_err(|e| {
        CLIENT_REQUEST_ERRORS.click();
        if e.is_timeout() {
            Error::timeout(format!("Request timed out: {}", e))
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    })?;

    if !response.status().is_success() {
        CLIENT_REQUEST_ERRORS.click();
        return Err(process_error_response(response).await);
    }
    Ok(response)
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    status: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

/// Process API response errors and convert to our Error type
async fn process_error_response(response: Response) -> Error {
    let status_code = response.status().as_u16();

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<u64>().ok());

    let error_body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            );
        }
    };

    error_for_status(status_code, &error_body, retry_after)
}

/// Map HTTP status code and body to the appropriate error type.
pub(crate) fn error_for_status(status_code: u16, body: &str, retry_after: Option<u64>) -> Error {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let error_type = detail
        .as_ref()
        .and_then(|d| d.error_type.clone().or_else(|| d.status.clone()));
    let param = detail.as_ref().and_then(|d| d.param.clone());
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| body.trim().to_string());

    match status_code {
        400 => Error::bad_request(message, param),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, error_type, message),
    }
}

/// Extracts an error carried inside a stream payload such as `{"error": {...}}`.
pub(crate) fn error_in_payload(value: &serde_json::Value) -> Option<Error> {
    let error = value.get("error")?;
    let message = match error {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    };
    Some(Error::streaming(message, None))
}
