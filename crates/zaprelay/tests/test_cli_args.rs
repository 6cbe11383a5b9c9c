//! CLI argument parsing tests for zaprelay

mod common;

use assert_cmd::Command;
use common::TestEnv;
use predicates::prelude::*;

fn zaprelay() -> Command {
    Command::new(env!("CARGO_BIN_EXE_zaprelay"))
}

#[test]
fn test_help_flag() {
    let mut cmd = zaprelay();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Relay prompts to an LLM agent"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("portal"));
}

#[test]
fn test_version_flag() {
    let mut cmd = zaprelay();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_no_args_shows_help() {
    let mut cmd = zaprelay();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_chat_help() {
    let mut cmd = zaprelay();
    cmd.args(["chat", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--llm"))
        .stdout(predicate::str::contains("--model-name"));
}

#[test]
fn test_chat_requires_llm() {
    let mut cmd = zaprelay();
    cmd.arg("chat");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--llm"));
}

#[test]
fn test_chat_unknown_llm() {
    let env = TestEnv::default();
    let mut cmd = env.command();
    cmd.args(["chat", "--llm", "gpt4"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains(
            "LLM must be either openai or hugging face",
        ));
}

#[test]
fn test_tools_unknown_llm() {
    let env = TestEnv::default();
    let mut cmd = env.command();
    cmd.args(["tools", "--llm", "claude"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains(
            "LLM must be either openai or hugging face",
        ));
}

#[test]
fn test_chat_accepts_underscore_model_flag() {
    let env = TestEnv::default();
    let mut cmd = env.command();
    cmd.args(["chat", "--llm", "openai", "--model_name", "gpt-3.5-turbo-instruct"]);
    cmd.write_stdin("exit\n");
    // Parses, then stops at the missing key
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_chat_missing_toolkit_key() {
    let env = TestEnv::default();
    let mut cmd = env.command();
    cmd.args(["chat", "--llm", "hugging face"]);
    cmd.env("HUGGINGFACEHUB_API_TOKEN", "hf_test");
    cmd.write_stdin("exit\n");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("ZAPIER_NLA_API_KEY"));
}

#[test]
fn test_portal_help() {
    let mut cmd = zaprelay();
    cmd.args(["portal", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn test_init_writes_config() {
    let env = TestEnv::default();
    let mut cmd = env.command();
    cmd.arg("init");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Initializing zaprelay"));

    let written = std::fs::read_to_string(env.config_file()).unwrap();
    assert!(written.contains("\"openai\""));
    assert!(written.contains("nla.zapier.com"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = zaprelay();
    cmd.arg("deploy");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
