//! Agent construction from a credential pair

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use zaprelay_config::{AgentSettings, CredentialPair, LlmKind, LlmSettings, ToolkitSettings};
use zaprelay_provider::{HuggingFaceProvider, OpenAiProvider, Provider};
use zaprelay_toolkit::{ToolSet, Toolkit, ZapierToolkit};

use crate::react::ReactAgent;
use crate::relay::PromptRunner;
use crate::Result;

/// Builds a ready-to-run agent for one credential pair
#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn build(&self, credentials: &CredentialPair) -> Result<Arc<dyn PromptRunner>>;
}

/// Builds [`ReactAgent`]s over the configured LLM and the automation toolkit
#[derive(Debug, Clone)]
pub struct ReactAgentFactory {
    llm: LlmSettings,
    toolkit: ToolkitSettings,
    agent: AgentSettings,
}

impl ReactAgentFactory {
    pub fn new(llm: LlmSettings, toolkit: ToolkitSettings, agent: AgentSettings) -> Self {
        Self {
            llm,
            toolkit,
            agent,
        }
    }

    pub fn llm(&self) -> &LlmSettings {
        &self.llm
    }

    fn provider(&self, api_key: &str) -> Arc<dyn Provider> {
        let base = Some(self.llm.api_base());
        let model = Some(self.llm.model());
        match self.llm.provider {
            LlmKind::OpenAi => Arc::new(OpenAiProvider::new(api_key, base, model)),
            LlmKind::HuggingFace => Arc::new(HuggingFaceProvider::new(api_key, base, model)),
        }
    }

    /// Build the agent and return it concretely
    pub async fn build_agent(&self, credentials: &CredentialPair) -> Result<ReactAgent> {
        self.llm.validate()?;

        let provider = self.provider(credentials.llm_key());
        let toolkit: Arc<dyn Toolkit> = Arc::new(ZapierToolkit::new(
            credentials.toolkit_key(),
            Some(self.toolkit.api_base.clone()),
        ));

        let actions = toolkit.list_actions().await?;
        let tools = ToolSet::from_actions(&actions);
        info!(
            "Built {} agent with model {} and {} tools",
            self.llm.provider,
            self.llm.model(),
            tools.len()
        );

        Ok(ReactAgent::new(
            provider,
            toolkit,
            tools,
            &self.llm,
            &self.agent,
        ))
    }
}

#[async_trait]
impl AgentFactory for ReactAgentFactory {
    async fn build(&self, credentials: &CredentialPair) -> Result<Arc<dyn PromptRunner>> {
        let agent = self.build_agent(credentials).await?;
        Ok(Arc::new(agent))
    }
}
