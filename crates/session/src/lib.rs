//! Per-browser session state for the portal
//!
//! Sessions live in memory only. Each one carries its gate state, the
//! credentials last submitted, and the agents built from them.

use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use zaprelay_config::CredentialPair;

pub mod gate;
pub mod registry;

pub use gate::{GateState, PasswordGate};
pub use registry::AgentRegistry;

/// Session errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Password incorrect")]
    PasswordIncorrect,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// State for one browser session
pub struct PortalSession<A: ?Sized> {
    pub id: String,
    pub gate: GateState,
    credentials: Option<CredentialPair>,
    pub agents: AgentRegistry<A>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl<A: ?Sized> PortalSession<A> {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            id: id.into(),
            gate: GateState::default(),
            credentials: None,
            agents: AgentRegistry::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Store the submitted keys; returns whether both were present.
    ///
    /// A submission missing either key forgets any earlier pair. Agents
    /// built for a replaced pair are dropped.
    pub fn set_credentials(&mut self, llm_key: &str, toolkit_key: &str) -> bool {
        let next = CredentialPair::new(llm_key, toolkit_key);
        if next != self.credentials && !self.agents.is_empty() {
            debug!("Credentials changed, dropping {} cached agents", self.agents.len());
            self.agents.clear();
        }
        self.credentials = next;
        self.touch();
        self.credentials.is_some()
    }

    pub fn credentials(&self) -> Option<&CredentialPair> {
        self.credentials.as_ref()
    }

    pub fn touch(&mut self) {
        self.updated_at = Local::now();
    }
}

/// Shared handle to one session
pub type SessionHandle<A> = Arc<Mutex<PortalSession<A>>>;

/// Bounds on the session store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub idle_timeout: Duration,
    pub max_sessions: usize,
}

impl SessionLimits {
    pub fn new(idle_minutes: u32, max_sessions: usize) -> Self {
        Self {
            idle_timeout: Duration::minutes(i64::from(idle_minutes)),
            max_sessions: max_sessions.max(1),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self::new(60, 256)
    }
}

/// In-memory session store keyed by random session id.
///
/// Creating a session first drops idle ones, then evicts the least recently
/// used while the store is full. Sessions locked by a running request count
/// as active and are never dropped.
pub struct SessionManager<A: ?Sized> {
    sessions: HashMap<String, SessionHandle<A>>,
    limits: SessionLimits,
}

impl<A: ?Sized> SessionManager<A> {
    pub fn new() -> Self {
        Self::with_limits(SessionLimits::default())
    }

    pub fn with_limits(limits: SessionLimits) -> Self {
        Self {
            sessions: HashMap::new(),
            limits,
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Start a new session with a fresh id
    pub fn create(&mut self) -> (String, SessionHandle<A>) {
        self.prune_idle();
        while self.sessions.len() >= self.limits.max_sessions {
            if !self.evict_oldest() {
                warn!("All {} sessions busy, exceeding limit", self.sessions.len());
                break;
            }
        }

        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(PortalSession::new(id.clone())));
        self.sessions.insert(id.clone(), session.clone());
        debug!("Created session ({} active)", self.sessions.len());
        (id, session)
    }

    pub fn get(&self, id: &str) -> Option<SessionHandle<A>> {
        self.sessions.get(id).cloned()
    }

    /// Existing session for `id`, or a new one when `id` is absent or unknown.
    ///
    /// The returned flag is true when a session was created.
    pub fn get_or_create(&mut self, id: Option<&str>) -> (String, SessionHandle<A>, bool) {
        if let Some(session) = id.and_then(|id| self.get(id)) {
            if let Ok(mut guard) = session.try_lock() {
                guard.touch();
            }
            let id = id.unwrap_or_default().to_string();
            return (id, session, false);
        }
        let (id, session) = self.create();
        (id, session, true)
    }

    /// Drop sessions not touched within the idle timeout; returns how many.
    pub fn prune_idle(&mut self) -> usize {
        let cutoff = Local::now() - self.limits.idle_timeout;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            session
                .try_lock()
                .map_or(true, |guard| guard.updated_at >= cutoff)
        });

        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!("Dropped {} idle sessions", removed);
        }
        removed
    }

    fn evict_oldest(&mut self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .filter_map(|(id, session)| {
                session
                    .try_lock()
                    .ok()
                    .map(|guard| (guard.updated_at, id.clone()))
            })
            .min();

        match oldest {
            Some((_, id)) => {
                self.sessions.remove(&id);
                debug!("Evicted least recently used session");
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<A: ?Sized> Default for SessionManager<A> {
    fn default() -> Self {
        Self::new()
    }
}
