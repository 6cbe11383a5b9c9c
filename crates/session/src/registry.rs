//! Agent handles memoized per credential pair

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use zaprelay_config::CredentialPair;

/// Built agents for one session, keyed by the exact credentials used.
///
/// A pair is built at most once while it stays cached; a failed build
/// caches nothing so the next attempt builds again.
pub struct AgentRegistry<A: ?Sized> {
    agents: HashMap<CredentialPair, Arc<A>>,
}

impl<A: ?Sized> AgentRegistry<A> {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    pub fn get(&self, credentials: &CredentialPair) -> Option<Arc<A>> {
        self.agents.get(credentials).cloned()
    }

    /// Cached handle for `credentials`, or the result of `build`
    pub async fn get_or_try_build<F, Fut, E>(
        &mut self,
        credentials: &CredentialPair,
        build: F,
    ) -> Result<Arc<A>, E>
    where
        F: FnOnce(CredentialPair) -> Fut,
        Fut: Future<Output = Result<Arc<A>, E>>,
    {
        if let Some(agent) = self.get(credentials) {
            debug!("Reusing cached agent");
            return Ok(agent);
        }

        let agent = build(credentials.clone()).await?;
        self.agents.insert(credentials.clone(), agent.clone());
        debug!("Cached new agent ({} in session)", self.agents.len());
        Ok(agent)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn clear(&mut self) {
        self.agents.clear();
    }
}

impl<A: ?Sized> Default for AgentRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
