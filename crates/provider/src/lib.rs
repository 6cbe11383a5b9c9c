//! LLM completion providers
//!
//! Text-completion clients for the LLM services the relay's agent can reason
//! with. Each provider takes a fully rendered prompt and returns the
//! continuation, cut at the first stop sequence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use thiserror::Error;

pub mod huggingface;
pub mod openai;

pub use huggingface::HuggingFaceProvider;
pub use openai::OpenAiProvider;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider rejected request: {0}")]
    Api(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("no API key configured")]
    NoApiKey,

    #[error("unexpected response shape")]
    InvalidResponse,

    #[error("rate limited by provider")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// One completion request
#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            prompt: String::new(),
            max_tokens: 256,
            temperature: 0.0,
            stop: Vec::new(),
        }
    }
}

/// Completion result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }
}

/// Token accounting, when the provider reports it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Text completion provider
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, params: CompletionParams) -> Result<Completion>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Cut `text` at the earliest occurrence of any stop sequence.
pub fn enforce_stop(text: &str, stop: &[String]) -> String {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
        .unwrap_or(text.len());
    text[..cut].to_string()
}

/// Map a non-success HTTP status and body to a provider error
pub(crate) fn status_error(status: reqwest::StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Unauthorized(message),
        429 => ProviderError::RateLimited,
        _ => ProviderError::Api(message),
    }
}
