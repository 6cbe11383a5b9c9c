//! Single shared-password gate in front of the portal

use tracing::{debug, warn};

use crate::{Result, SessionError};

/// Per-session gate state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateState {
    pub unlocked: bool,
    /// Entered password awaiting a check; never kept after one
    pub password: Option<String>,
}

/// Exact-match password check. No hashing, lockout, or expiry.
#[derive(Clone, Default)]
pub struct PasswordGate {
    secret: Option<String>,
}

impl PasswordGate {
    /// An empty secret disables the gate
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn open() -> Self {
        Self { secret: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Whether a session may see the form
    pub fn admits(&self, state: &GateState) -> bool {
        !self.is_enabled() || state.unlocked
    }

    /// Check the pending password in `state`, consuming it
    pub fn check(&self, state: &mut GateState) -> Result<()> {
        let entered = state.password.take();
        if self.admits(state) {
            return Ok(());
        }

        match (&self.secret, entered) {
            (Some(secret), Some(entered)) if *secret == entered => {
                debug!("Gate unlocked");
                state.unlocked = true;
                Ok(())
            }
            _ => {
                warn!("Gate password mismatch");
                Err(SessionError::PasswordIncorrect)
            }
        }
    }

    /// Record `password` as the pending entry and check it
    pub fn submit(&self, state: &mut GateState, password: impl Into<String>) -> Result<()> {
        state.password = Some(password.into());
        self.check(state)
    }
}

impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
