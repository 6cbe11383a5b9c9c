//! Zero-shot prompt rendering and LLM output parsing

use regex::Regex;
use std::sync::OnceLock;

use zaprelay_toolkit::ToolSet;

use crate::{AgentError, Result};

/// Stop sequence so the model never invents its own observations
pub const OBSERVATION_STOP: &str = "\nObservation:";

pub const FINAL_ANSWER: &str = "Final Answer:";

const PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

/// Next step decided by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Act { tool: String, input: String },
    Finish(String),
}

/// Render the full prompt for one step
pub fn render(tools: &ToolSet, question: &str, scratchpad: &str) -> String {
    let tool_lines: Vec<String> = tools
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect();
    let tool_names = tools.names().join(", ");

    format!(
        "{}\n\n{}\n\n{}\n\nBegin!\n\nQuestion: {}\nThought:{}",
        PREFIX,
        tool_lines.join("\n"),
        FORMAT_INSTRUCTIONS.replace("{tool_names}", &tool_names),
        question,
        scratchpad
    )
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:(.*?)\n*Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
            .expect("action pattern compiles")
    })
}

/// Parse one model continuation into the next step
pub fn parse(text: &str) -> Result<AgentStep> {
    if let Some((_, answer)) = text.rsplit_once(FINAL_ANSWER) {
        return Ok(AgentStep::Finish(answer.trim().to_string()));
    }

    let captures = action_regex()
        .captures(text)
        .ok_or_else(|| AgentError::OutputParse(text.to_string()))?;

    let tool = captures[1].trim().to_string();
    let input = captures[2].trim().trim_matches('"').to_string();
    if tool.is_empty() {
        return Err(AgentError::OutputParse(text.to_string()));
    }

    Ok(AgentStep::Act { tool, input })
}
