use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::agent::history::ConversationEntry;
use crate::agent::record::GenerationOutcome;

/// Base interface for all agent implementations
#[async_trait]
pub trait AgentInterface: Send + Sync {
    /// Turn a free-form description into a structured record.
    ///
    /// Never fails: when the model path cannot produce a record the
    /// outcome carries a fallback record and says so in its provenance.
    ///
    /// # Arguments
    /// * `text` - Raw user description
    /// * `temperature` - Sampling temperature forwarded to the service
    /// * `cancel` - Aborts the service call or a backoff wait early
    async fn generate(
        &self,
        text: &str,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> GenerationOutcome;

    /// Same as `generate`, then records the exchange in the agent's history.
    async fn process_user_query(
        &self,
        text: &str,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> GenerationOutcome;

    /// Snapshot of the conversation history, oldest first.
    async fn history(&self) -> Vec<ConversationEntry>;
}
