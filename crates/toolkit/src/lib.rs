//! Automation platform toolkit
//!
//! Enumerates the natural-language actions an automation platform key has
//! exposed and runs them with plain-text instructions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod zapier;

pub use zapier::ZapierToolkit;

/// Toolkit errors
#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("automation platform rejected request: {0}")]
    Api(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("rate limited by automation platform")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ToolkitError>;

/// One exposed action as listed by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    /// Human label, e.g. "Gmail: Send Email"
    pub description: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

/// Name and description of a tool, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Source of runnable actions
#[async_trait]
pub trait Toolkit: Send + Sync {
    async fn list_actions(&self) -> Result<Vec<Action>>;
    async fn run_action(&self, action_id: &str, instructions: &str) -> Result<String>;
}

/// A tool backed by one exposed action
#[derive(Debug, Clone)]
pub struct ActionTool {
    pub action_id: String,
    pub name: String,
    pub description: String,
}

impl ActionTool {
    pub fn from_action(action: &Action) -> Self {
        let params: Vec<&str> = action
            .params
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "instructions")
            .collect();
        let params = if params.is_empty() {
            "none".to_string()
        } else {
            params.join(", ")
        };

        let description = format!(
            "Runs the automation action \"{}\". The input is a natural language instruction, \
             for example \"get the latest email from my bank\" or \"send a Slack message to \
             the #general channel\". Parameters are inferred from the instruction: {}.",
            action.description, params
        );

        Self {
            action_id: action.id.clone(),
            name: action.description.clone(),
            description,
        }
    }

    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Tools in listing order, addressable by name
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: Vec<ActionTool>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_actions(actions: &[Action]) -> Self {
        let mut set = Self::new();
        for action in actions {
            set.register(ActionTool::from_action(action));
        }
        set
    }

    /// Later registrations replace earlier ones with the same name
    pub fn register(&mut self, tool: ActionTool) {
        self.tools.retain(|t| t.name != tool.name);
        self.tools.push(tool);
    }

    /// Exact name match, falling back to a trimmed case-insensitive match
    pub fn get(&self, name: &str) -> Option<&ActionTool> {
        self.tools.iter().find(|t| t.name == name).or_else(|| {
            let wanted = name.trim().to_lowercase();
            self.tools
                .iter()
                .find(|t| t.name.to_lowercase() == wanted)
        })
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    pub fn summaries(&self) -> Vec<ToolSummary> {
        self.tools.iter().map(ActionTool::summary).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionTool> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
