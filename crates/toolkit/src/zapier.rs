//! Zapier Natural Language Actions client

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::*;

/// Zapier NLA toolkit authenticated with an API key
pub struct ZapierToolkit {
    client: Client,
    api_key: String,
    api_base: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Action>,
}

impl ZapierToolkit {
    pub fn new(api_key: impl Into<String>, api_base: Option<String>) -> Self {
        let api_base = api_base
            .unwrap_or_else(|| "https://nla.zapier.com".to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base,
        }
    }

    fn exposed_url(&self) -> String {
        format!("{}/api/v1/exposed/", self.api_base)
    }

    fn execute_url(&self, action_id: &str) -> String {
        format!("{}/api/v1/exposed/{}/execute/", self.api_base, action_id)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| {
                    v["detail"]
                        .as_str()
                        .or_else(|| v["error"].as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(match status.as_u16() {
                401 | 403 => ToolkitError::Unauthorized(message),
                429 => ToolkitError::RateLimited,
                _ => ToolkitError::Api(message),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Toolkit for ZapierToolkit {
    async fn list_actions(&self) -> Result<Vec<Action>> {
        let response = self
            .client
            .get(self.exposed_url())
            .header("Accept", "application/json")
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let json = Self::read_json(response).await?;
        let listing: ListResponse = serde_json::from_value(json)?;
        debug!("Automation platform exposes {} actions", listing.results.len());
        Ok(listing.results)
    }

    /// Runs one action and returns its `result` object as JSON text.
    async fn run_action(&self, action_id: &str, instructions: &str) -> Result<String> {
        debug!("Running action {}", action_id);

        let response = self
            .client
            .post(self.execute_url(action_id))
            .header("Accept", "application/json")
            .header("X-API-Key", &self.api_key)
            .json(&json!({ "instructions": instructions }))
            .send()
            .await?;

        let json = Self::read_json(response).await?;

        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            warn!("Action {} failed: {}", action_id, message);
            return Err(ToolkitError::ActionFailed(message));
        }

        let result = json.get("result").cloned().unwrap_or(Value::Null);
        Ok(serde_json::to_string(&result)?)
    }
}
