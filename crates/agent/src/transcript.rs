//! Raw output buffer for one agent run

use std::fmt::Display;

/// Everything an agent writes during one run, ANSI colors included
#[derive(Debug, Default)]
pub struct Transcript {
    buffer: String,
}

impl Transcript {
    pub fn captured() -> Self {
        Self::default()
    }

    pub fn write(&mut self, text: impl Display) {
        self.buffer.push_str(&text.to_string());
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}
