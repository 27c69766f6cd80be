use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical six-field description of the object to synthesize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredObjectRecord {
    pub object: String,
    #[serde(default)]
    pub dimensions: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub modifications: Vec<String>,
}

impl StructuredObjectRecord {
    /// Record with only `object` populated.
    pub fn object_only(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            dimensions: String::new(),
            material: String::new(),
            color: String::new(),
            style: String::new(),
            modifications: Vec::new(),
        }
    }

    /// Text handed to the geometry synthesis stage:
    /// object, color, material and style joined by single spaces.
    pub fn conditioning_string(&self) -> String {
        [&self.object, &self.color, &self.material, &self.style]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Why a run ended on the keyword fallback instead of the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    RateLimitExhausted,
    DispatchFailure,
    Cancelled,
    TimedOut,
    ExtractionFailure,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FallbackReason::RateLimitExhausted => "rate_limit_exhausted",
            FallbackReason::DispatchFailure => "dispatch_failure",
            FallbackReason::Cancelled => "cancelled",
            FallbackReason::TimedOut => "timed_out",
            FallbackReason::ExtractionFailure => "extraction_failure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Model,
    Fallback(FallbackReason),
}

impl Provenance {
    pub fn label(&self) -> &'static str {
        match self {
            Provenance::Model => "model",
            Provenance::Fallback(_) => "fallback",
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Provenance::Model => None,
            Provenance::Fallback(reason) => Some(*reason),
        }
    }
}

/// Result of one pipeline run. The record itself stays six fields wide;
/// provenance travels beside it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub record: StructuredObjectRecord,
    pub provenance: Provenance,
}

impl GenerationOutcome {
    /// JSON view used by the HTTP layer and the CLI.
    pub fn to_dict(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "record": self.record,
            "provenance": self.provenance.label(),
            "conditioning": self.record.conditioning_string(),
        });
        if let Some(reason) = self.provenance.fallback_reason() {
            value["fallback_reason"] = serde_json::json!(reason);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_exactly_six_fields() {
        let record = StructuredObjectRecord::object_only("chair");
        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 6);
        assert_eq!(value["modifications"], serde_json::json!([]));
    }

    #[test]
    fn conditioning_string_skips_empty_parts() {
        let mut record = StructuredObjectRecord::object_only("chair");
        record.color = "green".to_string();
        record.style = "modern".to_string();
        assert_eq!(record.conditioning_string(), "chair green modern");
    }

    #[test]
    fn conditioning_string_orders_object_color_material_style() {
        let record = StructuredObjectRecord {
            object: "table".to_string(),
            dimensions: "1m".to_string(),
            material: "wooden".to_string(),
            color: "red".to_string(),
            style: "vintage".to_string(),
            modifications: vec!["drawer".to_string()],
        };
        assert_eq!(record.conditioning_string(), "table red wooden vintage");
    }

    #[test]
    fn outcome_dict_reports_fallback_reason() {
        let outcome = GenerationOutcome {
            record: StructuredObjectRecord::object_only("object"),
            provenance: Provenance::Fallback(FallbackReason::ExtractionFailure),
        };
        let dict = outcome.to_dict();
        assert_eq!(dict["provenance"], "fallback");
        assert_eq!(dict["fallback_reason"], "extraction_failure");
        assert_eq!(dict["conditioning"], "object");
    }

    #[test]
    fn outcome_dict_omits_reason_for_model_results() {
        let outcome = GenerationOutcome {
            record: StructuredObjectRecord::object_only("vase"),
            provenance: Provenance::Model,
        };
        let dict = outcome.to_dict();
        assert_eq!(dict["provenance"], "model");
        assert!(dict.get("fallback_reason").is_none());
    }
}
