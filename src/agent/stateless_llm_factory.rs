use std::sync::Arc;
use tracing::info;

use crate::agent::stateless_llm::openai_compatible_llm::OpenAICompatibleLLM;
use crate::agent::stateless_llm::StatelessLLMInterface;
use crate::config::LlmConfig;
use crate::error::ConfigError;

/// Factory for creating stateless LLM instances
pub struct StatelessLLMFactory;

impl StatelessLLMFactory {
    /// Default endpoint for a provider when `base_url` is left empty.
    pub fn default_base_url(llm_provider: &str) -> Option<&'static str> {
        match llm_provider {
            "siliconflow_llm" => Some("https://api.siliconflow.cn/v1"),
            "deepseek_llm" => Some("https://api.deepseek.com/v1"),
            "openai_llm" => Some("https://api.openai.com/v1"),
            "zhipu_llm" => Some("https://open.bigmodel.cn/api/paas/v4"),
            "groq_llm" => Some("https://api.groq.com/openai/v1"),
            "mistral_llm" => Some("https://api.mistral.ai/v1"),
            _ => None,
        }
    }

    /// Create an LLM based on the configuration.
    ///
    /// Every supported provider speaks the OpenAI chat completions protocol;
    /// they differ only in their default endpoint.
    pub fn create_llm(config: &LlmConfig) -> Result<Arc<dyn StatelessLLMInterface>, ConfigError> {
        info!("Initializing LLM: {}", config.provider);

        if config.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let base_url = if !config.base_url.trim().is_empty() {
            config.base_url.clone()
        } else if config.provider == "openai_compatible_llm" {
            return Err(ConfigError::UnsupportedProvider(
                "openai_compatible_llm requires llm_config.base_url".to_string(),
            ));
        } else {
            Self::default_base_url(&config.provider)
                .ok_or_else(|| ConfigError::UnsupportedProvider(config.provider.clone()))?
                .to_string()
        };

        Ok(Arc::new(OpenAICompatibleLLM::new(
            config.model.clone(),
            base_url,
            config.llm_api_key.clone(),
            config.request_timeout_secs,
        )))
    }
}
