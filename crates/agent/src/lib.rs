//! Agent core
//!
//! Builds a reasoning agent over an LLM provider and an automation toolkit,
//! relays prompts to it, and cleans its transcript for display.

use thiserror::Error;

use zaprelay_config::ConfigError;
use zaprelay_provider::ProviderError;
use zaprelay_toolkit::ToolkitError;

pub mod factory;
pub mod format;
pub mod prompt;
pub mod react;
pub mod relay;
pub mod transcript;

pub use factory::{AgentFactory, ReactAgentFactory};
pub use format::{format_transcript, strip_ansi};
pub use react::ReactAgent;
pub use relay::{
    is_exit_sentinel, relay_prompt, run_text_relay, should_relay, FailureCause, LoopState,
    PromptRunner, RelayFailure, RelayReply,
};
pub use transcript::Transcript;
pub use zaprelay_toolkit::ToolSummary;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Toolkit(#[from] ToolkitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not parse LLM output: `{0}`")]
    OutputParse(String),

    #[error("agent stopped after {0} iterations without a final answer")]
    MaxIterations(u32),
}

pub type Result<T> = std::result::Result<T, AgentError>;
