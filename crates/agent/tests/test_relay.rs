//! Tests for prompt relaying and the text loop

use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Mutex;

use zaprelay_agent::{
    relay_prompt, run_text_relay, AgentError, FailureCause, PromptRunner, ToolSummary, Transcript,
};
use zaprelay_toolkit::ToolkitError;

/// Echoes prompts back as a fake run, failing on "fail"
#[derive(Default)]
struct EchoRunner {
    seen: Mutex<Vec<String>>,
}

impl EchoRunner {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromptRunner for EchoRunner {
    async fn run(&self, prompt: &str, transcript: &mut Transcript) -> zaprelay_agent::Result<String> {
        self.seen.lock().unwrap().push(prompt.to_string());
        transcript.write("\x1b[32mThought: echo...Final Answer: ");
        transcript.write(prompt);
        transcript.write("\x1b[0m");

        if prompt == "fail" {
            return Err(AgentError::Toolkit(ToolkitError::ActionFailed(
                "Zap is off".to_string(),
            )));
        }
        Ok(prompt.to_string())
    }

    fn tools(&self) -> Vec<ToolSummary> {
        Vec::new()
    }
}

#[tokio::test]
async fn test_relay_prompt_success() {
    let runner = EchoRunner::default();
    let reply = relay_prompt(&runner, "hello").await;

    assert!(reply.is_success());
    assert_eq!(reply.result.unwrap(), "hello");
    assert_eq!(
        reply.transcript,
        "\n**Thought**: echo...\n\n\n**Final Answer**: hello"
    );
}

#[tokio::test]
async fn test_relay_prompt_failure_keeps_transcript() {
    let runner = EchoRunner::default();
    let reply = relay_prompt(&runner, "fail").await;

    let failure = reply.result.unwrap_err();
    assert_eq!(failure.cause, FailureCause::Toolkit);
    assert_eq!(failure.user_message(), "Failure while executing: action failed: Zap is off");
    assert!(reply.transcript.ends_with("**Final Answer**: fail"));
    assert!(!reply.transcript.contains('\x1b'));
}

#[tokio::test]
async fn test_relay_prompt_through_trait_object() {
    let runner: std::sync::Arc<dyn PromptRunner> = std::sync::Arc::new(EchoRunner::default());
    let reply = relay_prompt(runner.as_ref(), "hi").await;
    assert_eq!(reply.result.unwrap(), "hi");
}

#[tokio::test]
async fn test_text_loop_until_exit() {
    let runner = EchoRunner::default();
    let input = Cursor::new("first\nsecond\nexit\nnever\n");
    let mut output = Vec::new();

    let runs = run_text_relay(&runner, input, &mut output).await.unwrap();

    assert_eq!(runs, 2);
    assert_eq!(runner.seen(), vec!["first", "second"]);
    let text = String::from_utf8(output).unwrap();
    assert!(text.starts_with("Enter prompt or type 'exit' to end session.\n"));
    assert!(text.contains("Final Answer: first"));
    assert!(!text.contains("never"));
}

#[tokio::test]
async fn test_text_loop_skips_blank_lines() {
    let runner = EchoRunner::default();
    let input = Cursor::new("\n   \nsomething\n");
    let mut output = Vec::new();

    let runs = run_text_relay(&runner, input, &mut output).await.unwrap();

    assert_eq!(runs, 1);
    assert_eq!(runner.seen(), vec!["something"]);
}

#[tokio::test]
async fn test_text_loop_ends_at_eof() {
    let runner = EchoRunner::default();
    let mut output = Vec::new();

    let runs = run_text_relay(&runner, Cursor::new(""), &mut output).await.unwrap();

    assert_eq!(runs, 0);
    assert!(runner.seen().is_empty());
}

#[tokio::test]
async fn test_text_loop_exit_is_case_insensitive() {
    let runner = EchoRunner::default();
    let mut output = Vec::new();

    let runs = run_text_relay(&runner, Cursor::new("EXIT\r\nhello\n"), &mut output)
        .await
        .unwrap();

    assert_eq!(runs, 0);
}

#[tokio::test]
async fn test_text_loop_reports_failure_and_continues() {
    let runner = EchoRunner::default();
    let input = Cursor::new("fail\nafter\n");
    let mut output = Vec::new();

    let runs = run_text_relay(&runner, input, &mut output).await.unwrap();

    assert_eq!(runs, 2);
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Failure while executing: action failed: Zap is off"));
    assert!(text.contains("Final Answer: after"));
}

#[tokio::test]
async fn test_text_loop_keeps_inner_whitespace() {
    let runner = EchoRunner::default();
    let mut output = Vec::new();

    run_text_relay(&runner, Cursor::new("  padded prompt \n"), &mut output)
        .await
        .unwrap();

    assert_eq!(runner.seen(), vec!["  padded prompt "]);
}
