use std::sync::Arc;
use tracing::debug;

use super::english::{EnglishEnforcer, UNKNOWN_OBJECT};
use super::record::StructuredObjectRecord;
use super::vocabulary::Vocabulary;

/// Deterministic keyword matcher used whenever the model path fails.
/// Never fails itself.
#[derive(Debug, Clone)]
pub struct FallbackInferencer {
    vocabulary: Arc<Vocabulary>,
    enforcer: EnglishEnforcer,
}

impl FallbackInferencer {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        let enforcer = EnglishEnforcer::new(vocabulary.clone());
        Self {
            vocabulary,
            enforcer,
        }
    }

    /// Object-only record inferred from the sanitized input.
    pub fn infer(&self, sanitized: &str) -> StructuredObjectRecord {
        let object = self.infer_object(sanitized);
        debug!("Fallback inferred object '{}'", object);
        self.enforcer
            .enforce(StructuredObjectRecord::object_only(object))
    }

    /// Primary keywords first (case-insensitive), then secondary keywords
    /// (case-sensitive), each in table order.
    fn infer_object(&self, text: &str) -> &str {
        let lower = text.to_lowercase();

        let primary_hit = self
            .vocabulary
            .categories
            .iter()
            .find(|c| lower.contains(&c.primary.to_lowercase()));
        if let Some(category) = primary_hit {
            return &category.name;
        }

        let secondary_hit = self.vocabulary.categories.iter().find(|c| {
            c.secondary
                .iter()
                .any(|keyword| !keyword.is_empty() && text.contains(keyword.as_str()))
        });
        match secondary_hit {
            Some(category) => &category.name,
            None => UNKNOWN_OBJECT,
        }
    }
}
