//! End-to-end chat runs against mock upstreams

mod common;

use common::TestEnv;
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::json;

fn mock_toolkit(server: &mut mockito::Server) -> mockito::Mock {
    server
        .mock("GET", "/api/v1/exposed/")
        .match_header("x-api-key", "nla-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [
                    { "id": "01A", "description": "Gmail: Find Email", "params": { "instructions": "str" } }
                ]
            })
            .to_string(),
        )
        .create()
}

#[test]
fn test_chat_lists_tools_and_relays_prompt() {
    let mut server = mockito::Server::new();
    let toolkit = mock_toolkit(&mut server);
    let completion = server
        .mock("POST", "/v1/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-3.5-turbo-instruct",
            "temperature": 0.0
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{ "text": " I know this\nFinal Answer: nothing new", "finish_reason": "stop" }]
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let env = TestEnv::default();
    env.write_config(&server.url()).unwrap();

    let mut cmd = env.command();
    cmd.args(["chat", "--llm", "openai"])
        .env("OPENAI_API_KEY", "sk-test")
        .env("ZAPIER_NLA_API_KEY", "nla-test")
        .write_stdin("anything new?\nexit\nnever sent\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Gmail: Find Email"))
        .stdout(predicate::str::contains("Enter prompt or type 'exit' to end session."))
        .stdout(predicate::str::contains("Final Answer: nothing new"))
        .stdout(predicate::str::contains("> Finished run."));

    toolkit.assert();
    completion.assert();
}

#[test]
fn test_chat_reports_run_failure_and_continues() {
    let mut server = mockito::Server::new();
    let _toolkit = mock_toolkit(&mut server);
    let _completion = server
        .mock("POST", "/v1/completions")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"model overloaded"}}"#)
        .expect(2)
        .create();

    let env = TestEnv::default();
    env.write_config(&server.url()).unwrap();

    let mut cmd = env.command();
    cmd.args(["chat", "--llm", "openai"])
        .env("OPENAI_API_KEY", "sk-test")
        .env("ZAPIER_NLA_API_KEY", "nla-test")
        .write_stdin("first\nsecond\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Failure while executing: provider rejected request: model overloaded").count(2))
        .stderr(predicate::str::contains("Prompt failed").not());
}

#[test]
fn test_chat_build_failure_exits() {
    let mut server = mockito::Server::new();
    let _toolkit = server
        .mock("GET", "/api/v1/exposed/")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Invalid API key."}"#)
        .create();

    let env = TestEnv::default();
    env.write_config(&server.url()).unwrap();

    let mut cmd = env.command();
    cmd.args(["tools", "--llm", "openai"])
        .env("OPENAI_API_KEY", "sk-test")
        .env("ZAPIER_NLA_API_KEY", "wrong");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to build agent"))
        .stderr(predicate::str::contains("Invalid API key."));
}
