//! Common test utilities for zaprelay integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Credential variables cleared from every test command
pub const SECRET_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "HUGGINGFACEHUB_API_TOKEN",
    "ZAPIER_NLA_API_KEY",
    "ZAPRELAY_PORTAL_PASSWORD",
];

/// Isolated home directory for one test
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let config_dir = temp_dir.path().join(".zaprelay");

        Ok(Self {
            temp_dir,
            config_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Command with HOME pointed at the temp dir, no inherited secrets or log filter
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_zaprelay"));
        cmd.env("HOME", self.temp_dir.path());
        for var in SECRET_VARS {
            cmd.env_remove(var);
        }
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Config pointing both upstreams at `base`
    pub fn write_config(&self, base: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let config = format!(
            r#"{{
  "llm": {{ "provider": "openai", "api_base": "{base}/v1" }},
  "toolkit": {{ "api_base": "{base}" }},
  "agent": {{ "max_iterations": 3 }}
}}"#
        );
        std::fs::write(self.config_file(), config)?;
        Ok(())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
