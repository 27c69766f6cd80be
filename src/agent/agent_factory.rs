use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::agent::agents::{AgentInterface, StructuringAgent};
use crate::agent::dispatcher::{RequestDispatcher, RetryPolicy};
use crate::agent::stateless_llm::StatelessLLMInterface;
use crate::agent::stateless_llm_factory::StatelessLLMFactory;
use crate::agent::vocabulary::Vocabulary;
use crate::config::Config;

/// Factory for creating agent instances
///
/// Holds what agents share: one HTTP client for the service and one copy
/// of the vocabulary tables. Each created agent owns its own history.
#[derive(Clone)]
pub struct AgentFactory {
    llm: Arc<dyn StatelessLLMInterface>,
    vocabulary: Arc<Vocabulary>,
    retry_policy: RetryPolicy,
    max_output_tokens: u32,
    history_capacity: usize,
}

impl AgentFactory {
    pub fn new(
        llm: Arc<dyn StatelessLLMInterface>,
        vocabulary: Arc<Vocabulary>,
        retry_policy: RetryPolicy,
        max_output_tokens: u32,
        history_capacity: usize,
    ) -> Self {
        Self {
            llm,
            vocabulary,
            retry_policy,
            max_output_tokens,
            history_capacity,
        }
    }

    /// Build the factory from configuration. Fails when the API key is
    /// missing, the provider is unknown or the vocabulary file is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm = StatelessLLMFactory::create_llm(&config.llm_config)?;
        let vocabulary = Vocabulary::from_optional_path(config.agent_config.vocabulary_path.as_deref())
            .context("Failed to load vocabulary tables")?;

        info!(
            "Agent factory ready: provider={}, model={}",
            config.llm_config.provider, config.llm_config.model
        );

        Ok(Self::new(
            llm,
            Arc::new(vocabulary),
            RetryPolicy::from(&config.retry_config),
            config.llm_config.max_tokens,
            config.agent_config.history_capacity,
        ))
    }

    pub fn create_structuring_agent(&self) -> StructuringAgent {
        let dispatcher = RequestDispatcher::new(self.llm.clone(), self.retry_policy.clone());
        StructuringAgent::new(
            dispatcher,
            self.vocabulary.clone(),
            self.max_output_tokens,
            self.history_capacity,
        )
    }

    pub fn create_agent(&self) -> Arc<dyn AgentInterface> {
        Arc::new(self.create_structuring_agent())
    }
}
