use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::agent_interface::AgentInterface;
use crate::agent::dispatcher::RequestDispatcher;
use crate::agent::english::EnglishEnforcer;
use crate::agent::extractor::extract_json_candidate;
use crate::agent::fallback::FallbackInferencer;
use crate::agent::history::{ConversationEntry, ConversationHistory};
use crate::agent::language::detect_language;
use crate::agent::normalizer::normalize_candidate;
use crate::agent::prompt::build_prompt;
use crate::agent::record::{FallbackReason, GenerationOutcome, Provenance, StructuredObjectRecord};
use crate::agent::sanitizer::sanitize_input;
use crate::agent::stateless_llm::GenerationRequest;
use crate::agent::vocabulary::Vocabulary;

/// Stages a request moves through. `Finalized` and `Fallback` are both
/// terminal and both yield a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Sanitized,
    LanguageKnown,
    PromptBuilt,
    Dispatched,
    Extracted,
    Normalized,
    Finalized,
    Fallback,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Agent that structures object descriptions, remembering each completed
/// exchange in a bounded history.
pub struct StructuringAgent {
    dispatcher: RequestDispatcher,
    enforcer: EnglishEnforcer,
    fallback: FallbackInferencer,
    max_output_tokens: u32,
    history: Mutex<ConversationHistory>,
}

impl StructuringAgent {
    /// Initialize the agent
    ///
    /// # Arguments
    /// * `dispatcher` - Retry-aware access to the text-generation service
    /// * `vocabulary` - Glossary and fallback category tables
    /// * `max_output_tokens` - Response length bound sent with each request
    /// * `history_capacity` - Maximum number of history entries kept
    pub fn new(
        dispatcher: RequestDispatcher,
        vocabulary: Arc<Vocabulary>,
        max_output_tokens: u32,
        history_capacity: usize,
    ) -> Self {
        info!(
            "StructuringAgent initialized (max_attempts={}, history_capacity={})",
            dispatcher.policy().max_attempts,
            history_capacity
        );
        Self {
            dispatcher,
            enforcer: EnglishEnforcer::new(vocabulary.clone()),
            fallback: FallbackInferencer::new(vocabulary),
            max_output_tokens,
            history: Mutex::new(ConversationHistory::new(history_capacity)),
        }
    }

    /// Run the full pipeline on one description.
    pub async fn generate_3d_prompt(
        &self,
        text: &str,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> GenerationOutcome {
        let sanitized = sanitize_input(text);
        trace_stage(PipelineStage::Sanitized);

        let language = detect_language(&sanitized);
        trace_stage(PipelineStage::LanguageKnown);
        debug!("Detected language: {}", language);

        let prompt = build_prompt(&sanitized, language);
        trace_stage(PipelineStage::PromptBuilt);

        let request = GenerationRequest::from_prompt(prompt, temperature, self.max_output_tokens);
        let raw = match self.dispatcher.dispatch(&request, cancel).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("LLM dispatch failed: {}", e);
                return self.fall_back(&sanitized, e.fallback_reason());
            }
        };
        trace_stage(PipelineStage::Dispatched);

        let candidate = extract_json_candidate(&raw);
        trace_stage(PipelineStage::Extracted);

        let record = match normalize_candidate(candidate) {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not parse LLM response: {}", e);
                return self.fall_back(&sanitized, FallbackReason::ExtractionFailure);
            }
        };
        trace_stage(PipelineStage::Normalized);

        let record = self.enforcer.enforce(record);
        trace_stage(PipelineStage::Finalized);

        GenerationOutcome {
            record,
            provenance: Provenance::Model,
        }
    }

    fn fall_back(&self, sanitized: &str, reason: FallbackReason) -> GenerationOutcome {
        trace_stage(PipelineStage::Fallback);
        info!("Using keyword fallback ({})", reason);
        GenerationOutcome {
            record: self.fallback.infer(sanitized),
            provenance: Provenance::Fallback(reason),
        }
    }
}

fn trace_stage(stage: PipelineStage) {
    debug!("Pipeline stage: {}", stage);
}

fn record_to_json(record: &StructuredObjectRecord) -> String {
    serde_json::to_string(record).unwrap_or_default()
}

#[async_trait]
impl AgentInterface for StructuringAgent {
    async fn generate(
        &self,
        text: &str,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> GenerationOutcome {
        self.generate_3d_prompt(text, temperature, cancel).await
    }

    async fn process_user_query(
        &self,
        text: &str,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> GenerationOutcome {
        let outcome = self.generate_3d_prompt(text, temperature, cancel).await;
        let mut history = self.history.lock().await;
        history.push_exchange(text, record_to_json(&outcome.record));
        debug!(
            "History holds {}/{} entries",
            history.len(),
            history.capacity()
        );
        drop(history);
        outcome
    }

    async fn history(&self) -> Vec<ConversationEntry> {
        self.history.lock().await.entries()
    }
}
