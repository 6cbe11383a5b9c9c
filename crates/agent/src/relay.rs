//! Prompt relaying: one prompt in, cleaned transcript and result out

use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

use zaprelay_provider::ProviderError;
use zaprelay_toolkit::{ToolSummary, ToolkitError};

use crate::format::format_transcript;
use crate::transcript::Transcript;
use crate::{AgentError, Result};

/// Placeholder text the portal's input box starts with
pub const PROMPT_PLACEHOLDER: &str = "Enter Prompt";

/// Word that ends a text session
pub const EXIT_SENTINEL: &str = "exit";

/// Anything that can answer a prompt with the toolkit's actions
#[async_trait]
pub trait PromptRunner: Send + Sync {
    async fn run(&self, prompt: &str, transcript: &mut Transcript) -> Result<String>;

    /// Tools available to the runner, in listing order
    fn tools(&self) -> Vec<ToolSummary>;
}

/// Coarse classification of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    Authentication,
    RateLimit,
    Network,
    Model,
    Toolkit,
    Agent,
}

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCause::Authentication => "authentication",
            FailureCause::RateLimit => "rate limit",
            FailureCause::Network => "network",
            FailureCause::Model => "model",
            FailureCause::Toolkit => "toolkit",
            FailureCause::Agent => "agent",
        }
    }
}

/// A failed run, with a message fit for the person who sent the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFailure {
    pub cause: FailureCause,
    pub message: String,
}

impl RelayFailure {
    /// Line shown in place of a result
    pub fn user_message(&self) -> String {
        format!("Failure while executing: {}", self.message)
    }
}

impl std::fmt::Display for RelayFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failure: {}", self.cause.as_str(), self.message)
    }
}

impl From<&AgentError> for RelayFailure {
    fn from(err: &AgentError) -> Self {
        let cause = match err {
            AgentError::Provider(ProviderError::Unauthorized(_) | ProviderError::NoApiKey)
            | AgentError::Toolkit(ToolkitError::Unauthorized(_)) => FailureCause::Authentication,
            AgentError::Provider(ProviderError::RateLimited)
            | AgentError::Toolkit(ToolkitError::RateLimited) => FailureCause::RateLimit,
            AgentError::Provider(ProviderError::Request(_))
            | AgentError::Toolkit(ToolkitError::Request(_)) => FailureCause::Network,
            AgentError::Provider(_) => FailureCause::Model,
            AgentError::Toolkit(_) => FailureCause::Toolkit,
            AgentError::Config(_) | AgentError::OutputParse(_) | AgentError::MaxIterations(_) => {
                FailureCause::Agent
            }
        };

        Self {
            cause,
            message: err.to_string(),
        }
    }
}

impl From<AgentError> for RelayFailure {
    fn from(err: AgentError) -> Self {
        Self::from(&err)
    }
}

/// Outcome of relaying one prompt
#[derive(Debug, Clone)]
pub struct RelayReply {
    /// Display-formatted transcript of the run, possibly partial
    pub transcript: String,
    pub result: std::result::Result<String, RelayFailure>,
}

impl RelayReply {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run one prompt and capture its transcript for display.
///
/// Failures never escape: they come back in `result` alongside whatever
/// transcript was produced before the failure.
pub async fn relay_prompt<R: PromptRunner + ?Sized>(runner: &R, prompt: &str) -> RelayReply {
    let mut transcript = Transcript::captured();
    let result = runner.run(prompt, &mut transcript).await;

    let result = result.map_err(|e| {
        warn!("Prompt failed: {}", e);
        RelayFailure::from(&e)
    });

    RelayReply {
        transcript: format_transcript(transcript.as_str()),
        result,
    }
}

/// Whether a submitted portal prompt should reach the agent
pub fn should_relay(prompt: &str) -> bool {
    let prompt = prompt.trim();
    !prompt.is_empty() && prompt != PROMPT_PLACEHOLDER
}

/// Whether a text-loop line ends the session
pub fn is_exit_sentinel(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_SENTINEL)
}

/// Text loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    Terminated,
}

/// Read prompts line by line until the exit word or end of input.
///
/// The input prompt is printed before every read. Each prompt's raw
/// transcript is written to `output`, followed by a failure line when the
/// run fails. Blank lines are skipped. Returns how many prompts were run.
pub async fn run_text_relay<R, I, O>(runner: &R, mut input: I, output: &mut O) -> io::Result<usize>
where
    R: PromptRunner + ?Sized,
    I: BufRead,
    O: Write,
{
    let mut state = LoopState::AwaitingInput;
    let mut runs = 0;
    let mut line = String::new();

    while state == LoopState::AwaitingInput {
        writeln!(output, "Enter prompt or type '{}' to end session.", EXIT_SENTINEL)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            debug!("Input closed");
            state = LoopState::Terminated;
            continue;
        }

        let prompt = line.trim_end_matches(['\n', '\r']);
        if is_exit_sentinel(prompt) {
            state = LoopState::Terminated;
            continue;
        }
        if prompt.trim().is_empty() {
            continue;
        }

        info!("Relaying prompt");
        let mut transcript = Transcript::captured();
        let result = runner.run(prompt, &mut transcript).await;
        runs += 1;

        output.write_all(transcript.as_str().as_bytes())?;
        if let Err(e) = result {
            warn!("Prompt failed: {}", e);
            writeln!(output, "\n{}", RelayFailure::from(&e).user_message())?;
        }
        writeln!(output)?;
        output.flush()?;
    }

    Ok(runs)
}
