//! Configuration for zaprelay
//!
//! Loads relay settings from a JSON file and resolves the LLM provider
//! selection and credential references the relay needs before it can build
//! an agent.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod credentials;
pub mod paths;

pub use credentials::CredentialPair;
pub use paths::{config_path, data_dir};

/// Environment variable holding the automation platform key
pub const TOOLKIT_KEY_ENV: &str = "ZAPIER_NLA_API_KEY";

/// Environment variable overriding the portal gate password
pub const GATE_PASSWORD_ENV: &str = "ZAPRELAY_PORTAL_PASSWORD";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM must be either openai or hugging face")]
    UnknownLlm(String),

    #[error("missing credential: set {0}")]
    MissingCredential(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LlmKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "hugging face")]
    HuggingFace,
}

impl LlmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmKind::OpenAi => "openai",
            LlmKind::HuggingFace => "hugging face",
        }
    }

    /// Model used when none is named
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmKind::OpenAi => "gpt-3.5-turbo-instruct",
            LlmKind::HuggingFace => "tiiuae/falcon-40b",
        }
    }

    /// Environment variable the provider key is read from
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmKind::OpenAi => "OPENAI_API_KEY",
            LlmKind::HuggingFace => "HUGGINGFACEHUB_API_TOKEN",
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            LlmKind::OpenAi => "https://api.openai.com/v1",
            LlmKind::HuggingFace => "https://api-inference.huggingface.co",
        }
    }
}

impl FromStr for LlmKind {
    type Err = ConfigError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmKind::OpenAi),
            "hugging face" => Ok(LlmKind::HuggingFace),
            _ => Err(ConfigError::UnknownLlm(s.to_string())),
        }
    }
}

impl std::fmt::Display for LlmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LLM call parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmKind,
    /// Model identifier; the provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Overrides the provider's key variable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self::for_provider(LlmKind::default())
    }
}

fn default_max_tokens() -> u32 {
    256
}

impl LlmSettings {
    /// Zero-temperature settings for a provider with its default model
    pub fn for_provider(provider: LlmKind) -> Self {
        Self {
            provider,
            model: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            api_base: None,
            api_key_env: None,
        }
    }

    /// Effective model identifier
    pub fn model(&self) -> String {
        match &self.model {
            Some(model) if !model.trim().is_empty() => model.trim().to_string(),
            _ => self.provider.default_model().to_string(),
        }
    }

    pub fn api_base(&self) -> String {
        self.api_base
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| self.provider.default_api_base().to_string())
    }

    pub fn api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.provider.api_key_env().to_string())
    }

    /// Check the settings before anything is constructed from them
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidSettings(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidSettings(
                "max_tokens must be positive".to_string(),
            ));
        }
        if self.model().is_empty() {
            return Err(ConfigError::InvalidSettings("empty model".to_string()));
        }
        Ok(())
    }
}

/// Automation platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolkitSettings {
    #[serde(default = "default_toolkit_base")]
    pub api_base: String,
    #[serde(default = "default_toolkit_key_env")]
    pub api_key_env: String,
}

impl Default for ToolkitSettings {
    fn default() -> Self {
        Self {
            api_base: default_toolkit_base(),
            api_key_env: default_toolkit_key_env(),
        }
    }
}

fn default_toolkit_base() -> String {
    "https://nla.zapier.com".to_string()
}

fn default_toolkit_key_env() -> String {
    TOOLKIT_KEY_ENV.to_string()
}

/// Agent loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_max_iterations() -> u32 {
    15
}

/// Page interface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_password: Option<String>,
    /// Sessions untouched for this long are dropped
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u32,
    /// Most sessions kept at once; the least recently used goes first
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            gate_password: None,
            session_idle_minutes: default_session_idle_minutes(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_session_idle_minutes() -> u32 {
    60
}

fn default_max_sessions() -> usize {
    256
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

impl PortalConfig {
    /// Gate password, environment first. `None` disables the gate.
    pub fn gate_password(&self) -> Option<String> {
        std::env::var(GATE_PASSWORD_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .or_else(|| self.gate_password.clone().filter(|p| !p.is_empty()))
    }
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub toolkit: ToolkitSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub portal: PortalConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location, defaults when the file is absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("Loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Saving config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Resolve LLM settings from a provider name and optional model,
    /// keeping file values when the file names the same provider.
    pub fn llm_settings_for(&self, llm: &str, model_name: Option<String>) -> Result<LlmSettings> {
        let provider: LlmKind = llm.parse()?;

        let mut settings = if self.llm.provider == provider {
            self.llm.clone()
        } else {
            LlmSettings::for_provider(provider)
        };
        if let Some(model) = model_name.filter(|m| !m.trim().is_empty()) {
            settings.model = Some(model);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Read both credentials from the environment
    pub fn credentials_from_env(&self, llm: &LlmSettings) -> Result<CredentialPair> {
        CredentialPair::from_env(&llm.api_key_env(), &self.toolkit.api_key_env)
    }
}

/// Write a default config unless one exists
pub async fn init() -> Result<PathBuf> {
    let path = config_path();

    if path.exists() {
        warn!("Config already exists at {:?}", path);
    } else {
        Config::default().save_to(&path).await?;
        info!("Config written to {:?}", path);
    }

    Ok(path)
}
