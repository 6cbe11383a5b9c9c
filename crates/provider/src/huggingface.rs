//! Hugging Face inference provider
//!
//! Text generation through the hosted inference API. The service does not
//! reliably honor stop sequences, so they are enforced on the returned text.

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

pub struct HuggingFaceProvider {
    client: Client,
    api_token: String,
    api_base: String,
    default_repo: String,
}

impl HuggingFaceProvider {
    pub fn new(
        api_token: impl Into<String>,
        api_base: Option<String>,
        default_repo: Option<String>,
    ) -> Self {
        let api_base = api_base
            .unwrap_or_else(|| "https://api-inference.huggingface.co".to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            client: Client::new(),
            api_token: api_token.into(),
            api_base,
            default_repo: default_repo.unwrap_or_else(|| "tiiuae/falcon-40b".to_string()),
        }
    }

    fn model_url(&self, repo: &str) -> String {
        let repo = if repo.is_empty() {
            &self.default_repo
        } else {
            repo
        };
        format!("{}/models/{}", self.api_base, repo)
    }

    fn build_request(&self, params: &CompletionParams) -> serde_json::Value {
        json!({
            "inputs": params.prompt,
            "parameters": {
                "temperature": params.temperature,
                "max_new_tokens": params.max_tokens,
                "return_full_text": false,
                "stop": params.stop,
            }
        })
    }

    /// Accepts both the list form and the single-object form of the reply.
    fn parse_response(&self, json: &serde_json::Value) -> Result<String> {
        let generated = match json {
            serde_json::Value::Array(items) => items
                .first()
                .and_then(|item| item["generated_text"].as_str()),
            other => other["generated_text"].as_str(),
        };
        generated
            .map(str::to_string)
            .ok_or(ProviderError::InvalidResponse)
    }
}

#[async_trait::async_trait]
impl Provider for HuggingFaceProvider {
    async fn complete(&self, params: CompletionParams) -> Result<Completion> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }

        let url = self.model_url(&params.model);
        trace!("Requesting generation from {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&self.build_request(&params))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(status_error(status, message));
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        let generated = self.parse_response(&json)?;
        let text = enforce_stop(&generated, &params.stop);
        debug!("Generation: {} chars", text.len());

        Ok(Completion::text(text))
    }

    fn default_model(&self) -> String {
        self.default_repo.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_token.is_empty()
    }
}
