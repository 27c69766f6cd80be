use async_trait::async_trait;

use crate::agent::prompt::PromptPair;
use crate::error::ServiceError;

/// One request to the text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub task_instruction: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    pub fn from_prompt(prompt: PromptPair, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            system_instruction: prompt.system_instruction,
            task_instruction: prompt.task_instruction,
            temperature,
            max_output_tokens,
        }
    }
}

/// Interface for a stateless language model
/// Stateless means the LLM doesn't store memory, system prompts, or user messages
#[async_trait]
pub trait StatelessLLMInterface: Send + Sync {
    /// Send one system + user exchange and return the raw response text.
    async fn chat_completion(&self, request: &GenerationRequest) -> Result<String, ServiceError>;
}
