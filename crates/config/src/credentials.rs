//! Credential pair

use std::fmt;

use crate::{ConfigError, Result};

/// LLM provider key and automation platform key.
///
/// Only constructible with both values non-empty, so nothing downstream
/// ever sees a partial pair. Never serialized; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialPair {
    llm_key: String,
    toolkit_key: String,
}

impl CredentialPair {
    /// `None` when either key is empty or whitespace
    pub fn new(llm_key: impl Into<String>, toolkit_key: impl Into<String>) -> Option<Self> {
        let llm_key = llm_key.into();
        let toolkit_key = toolkit_key.into();
        if llm_key.trim().is_empty() || toolkit_key.trim().is_empty() {
            return None;
        }
        Some(Self {
            llm_key,
            toolkit_key,
        })
    }

    /// Read both keys from the named environment variables
    pub fn from_env(llm_var: &str, toolkit_var: &str) -> Result<Self> {
        let llm_key = read_var(llm_var)?;
        let toolkit_key = read_var(toolkit_var)?;
        Ok(Self {
            llm_key,
            toolkit_key,
        })
    }

    pub fn llm_key(&self) -> &str {
        &self.llm_key
    }

    pub fn toolkit_key(&self) -> &str {
        &self.toolkit_key
    }
}

fn read_var(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingCredential(name.to_string()))
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("llm_key", &"[redacted]")
            .field("toolkit_key", &"[redacted]")
            .finish()
    }
}
