//! Reason-then-act agent over a completion model and a toolkit

use async_trait::async_trait;
use colored::Colorize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use zaprelay_config::{AgentSettings, LlmSettings};
use zaprelay_provider::{CompletionParams, Provider};
use zaprelay_toolkit::{ToolSet, ToolSummary, Toolkit};

use crate::prompt::{self, AgentStep, OBSERVATION_STOP};
use crate::relay::PromptRunner;
use crate::transcript::Transcript;
use crate::{AgentError, Result};

/// Zero-shot agent that picks one tool per step until it has a final answer
pub struct ReactAgent {
    provider: Arc<dyn Provider>,
    toolkit: Arc<dyn Toolkit>,
    tools: ToolSet,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_iterations: u32,
}

impl ReactAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        toolkit: Arc<dyn Toolkit>,
        tools: ToolSet,
        llm: &LlmSettings,
        agent: &AgentSettings,
    ) -> Self {
        Self {
            provider,
            toolkit,
            tools,
            model: llm.model(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            max_iterations: agent.max_iterations,
        }
    }

    pub fn tool_set(&self) -> &ToolSet {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one question to completion, writing every step to `transcript`
    pub async fn answer(&self, question: &str, transcript: &mut Transcript) -> Result<String> {
        info!("Agent run started ({} tools)", self.tools.len());
        transcript.write(format_args!("\n\n{}\n", "> Entering new agent run...".bold()));

        let mut scratchpad = String::new();

        for iteration in 1..=self.max_iterations {
            debug!("Agent iteration {}", iteration);

            let params = CompletionParams {
                model: self.model.clone(),
                prompt: prompt::render(&self.tools, question, &scratchpad),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                stop: vec![OBSERVATION_STOP.to_string()],
            };
            let completion = self.provider.complete(params).await?;
            let text = completion.text;
            transcript.write(text.green());

            match prompt::parse(&text)? {
                AgentStep::Finish(answer) => {
                    transcript.write(format_args!("\n{}\n", "> Finished run.".bold()));
                    info!("Agent run finished after {} iterations", iteration);
                    return Ok(answer);
                }
                AgentStep::Act { tool, input } => {
                    let observation = self.observe(&tool, &input).await?;

                    transcript.write("\nObservation: ");
                    transcript.write(observation.yellow());
                    transcript.write("\nThought:");

                    scratchpad.push_str(&text);
                    scratchpad.push_str("\nObservation: ");
                    scratchpad.push_str(&observation);
                    scratchpad.push_str("\nThought:");
                }
            }
        }

        warn!("Agent hit iteration cap of {}", self.max_iterations);
        Err(AgentError::MaxIterations(self.max_iterations))
    }

    async fn observe(&self, tool: &str, input: &str) -> Result<String> {
        match self.tools.get(tool) {
            Some(action) => {
                debug!("Running action {} ({})", action.name, action.action_id);
                Ok(self.toolkit.run_action(&action.action_id, input).await?)
            }
            None => {
                debug!("Model picked unknown tool: {}", tool);
                Ok(format!("{} is not a valid tool, try another one.", tool))
            }
        }
    }
}

#[async_trait]
impl PromptRunner for ReactAgent {
    async fn run(&self, prompt: &str, transcript: &mut Transcript) -> Result<String> {
        self.answer(prompt, transcript).await
    }

    fn tools(&self) -> Vec<ToolSummary> {
        self.tools.summaries()
    }
}
