//! OpenAI completions provider

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_base = api_base
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base,
            default_model: default_model
                .unwrap_or_else(|| "gpt-3.5-turbo-instruct".to_string()),
        }
    }

    fn build_request(&self, params: &CompletionParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let mut body = json!({
            "model": model,
            "prompt": params.prompt,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if !params.stop.is_empty() {
            body["stop"] = json!(params.stop);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Completion> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let text = choice["text"]
            .as_str()
            .ok_or(ProviderError::InvalidResponse)?
            .to_string();
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        // Missing counts read as zero
        let usage = &json["usage"];
        let count = |key: &str| usage[key].as_u64().unwrap_or(0) as u32;
        let usage = Usage {
            prompt_tokens: count("prompt_tokens"),
            completion_tokens: count("completion_tokens"),
            total_tokens: count("total_tokens"),
        };

        Ok(Completion {
            text,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, params: CompletionParams) -> Result<Completion> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }
        trace!("Requesting completion from {}", self.api_base);

        let url = format!("{}/completions", self.api_base);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(status_error(status, message));
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        let completion = self.parse_response(json)?;
        debug!(
            "Completion: {} chars, {} tokens",
            completion.text.len(),
            completion.usage.total_tokens
        );
        Ok(completion)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
