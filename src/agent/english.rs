use std::sync::Arc;

use super::language::is_cjk;
use super::record::StructuredObjectRecord;
use super::vocabulary::Vocabulary;

/// Placeholder used whenever a value cannot be rendered in English.
pub const UNKNOWN_OBJECT: &str = "object";

/// Guarantees that `object`, `material` and `style` are English.
/// `color`, `dimensions` and `modifications` are deliberately left alone.
#[derive(Debug, Clone)]
pub struct EnglishEnforcer {
    vocabulary: Arc<Vocabulary>,
}

impl EnglishEnforcer {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn enforce(&self, mut record: StructuredObjectRecord) -> StructuredObjectRecord {
        record.object = match self.ensure_english(&record.object) {
            Some(value) if !value.is_empty() => value,
            _ => UNKNOWN_OBJECT.to_string(),
        };
        record.material = self.ensure_english(&record.material).unwrap_or_default();
        record.style = self.ensure_english(&record.style).unwrap_or_default();
        record
    }

    /// `None` for an empty value, otherwise the English rendering.
    fn ensure_english(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        let all_cjk = trimmed
            .chars()
            .filter(|c| !c.is_whitespace())
            .all(is_cjk);
        if all_cjk {
            let translated = self.vocabulary.translate(trimmed).unwrap_or(UNKNOWN_OBJECT);
            return Some(translated.to_string());
        }

        if trimmed.chars().any(|c| c.is_ascii_alphabetic()) {
            return Some(value.to_string());
        }

        Some(UNKNOWN_OBJECT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enforcer() -> EnglishEnforcer {
        EnglishEnforcer::new(Arc::new(Vocabulary::default()))
    }

    fn record(object: &str, material: &str, style: &str) -> StructuredObjectRecord {
        StructuredObjectRecord {
            object: object.to_string(),
            dimensions: String::new(),
            material: material.to_string(),
            color: String::new(),
            style: style.to_string(),
            modifications: Vec::new(),
        }
    }

    #[test]
    fn translates_known_chinese_terms() {
        let out = enforcer().enforce(record("椅子", "木质", "现代风格"));
        assert_eq!(out.object, "chair");
        assert_eq!(out.material, "wooden");
        assert_eq!(out.style, "modern");
    }

    #[test]
    fn unknown_chinese_becomes_object() {
        let out = enforcer().enforce(record("柜子", "石头", ""));
        assert_eq!(out.object, "object");
        assert_eq!(out.material, "object");
    }

    #[test]
    fn latin_values_are_untouched() {
        let out = enforcer().enforce(record("Chair", "oak wood", "mid-century 现代"));
        assert_eq!(out.object, "Chair");
        assert_eq!(out.material, "oak wood");
        assert_eq!(out.style, "mid-century 现代");
    }

    #[test]
    fn symbol_only_values_become_object() {
        let out = enforcer().enforce(record("???", "123", "--"));
        assert_eq!(out.object, "object");
        assert_eq!(out.material, "object");
        assert_eq!(out.style, "object");
    }

    #[test]
    fn empty_optional_fields_stay_empty() {
        let out = enforcer().enforce(record("chair", "", "  "));
        assert_eq!(out.material, "");
        assert_eq!(out.style, "");
    }

    #[test]
    fn empty_object_becomes_object() {
        assert_eq!(enforcer().enforce(record("", "", "")).object, "object");
    }

    #[test]
    fn color_dimensions_and_modifications_pass_through() {
        let mut input = record("chair", "", "");
        input.color = "绿色".to_string();
        input.dimensions = "高一米".to_string();
        input.modifications = vec!["加扶手".to_string()];
        let out = enforcer().enforce(input.clone());
        assert_eq!(out.color, input.color);
        assert_eq!(out.dimensions, input.dimensions);
        assert_eq!(out.modifications, input.modifications);
    }

    #[test]
    fn enforcing_english_record_is_identity() {
        let input = record("table", "glass", "minimalist");
        let once = enforcer().enforce(input.clone());
        assert_eq!(once, input);
        assert_eq!(enforcer().enforce(once.clone()), once);
    }
}
