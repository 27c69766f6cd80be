use serde_json::{Map, Value};

use super::english::UNKNOWN_OBJECT;
use super::record::StructuredObjectRecord;
use crate::error::ExtractionError;

/// English key and its localized alias for each canonical field.
const OBJECT_KEYS: (&str, &str) = ("object", "物体");
const DIMENSIONS_KEYS: (&str, &str) = ("dimensions", "尺寸");
const MATERIAL_KEYS: (&str, &str) = ("material", "材质");
const COLOR_KEYS: (&str, &str) = ("color", "颜色");
const STYLE_KEYS: (&str, &str) = ("style", "风格");
const MODIFICATIONS_KEYS: (&str, &str) = ("modifications", "修改");

/// Parse a candidate string and map its (possibly Chinese) keys onto the
/// canonical six-field record.
pub fn normalize_candidate(candidate: &str) -> Result<StructuredObjectRecord, ExtractionError> {
    let value: Value = serde_json::from_str(candidate)?;
    let data = value.as_object().ok_or(ExtractionError::NotAnObject)?;

    Ok(StructuredObjectRecord {
        object: read_scalar(data, OBJECT_KEYS)?.unwrap_or_else(|| UNKNOWN_OBJECT.to_string()),
        dimensions: read_text(data, DIMENSIONS_KEYS).unwrap_or_default(),
        material: read_scalar(data, MATERIAL_KEYS)?.unwrap_or_default(),
        color: read_text(data, COLOR_KEYS).unwrap_or_default(),
        style: read_scalar(data, STYLE_KEYS)?.unwrap_or_default(),
        modifications: read_list(data, MODIFICATIONS_KEYS),
    })
}

/// English key first, alias second. Null counts as absent.
fn lookup<'a>(data: &'a Map<String, Value>, (key, alias): (&str, &str)) -> Option<&'a Value> {
    data.get(key)
        .filter(|v| !v.is_null())
        .or_else(|| data.get(alias).filter(|v| !v.is_null()))
}

fn read_text(data: &Map<String, Value>, keys: (&str, &str)) -> Option<String> {
    lookup(data, keys).map(value_to_text)
}

/// Fields that feed the conditioning string must be scalars.
fn read_scalar(
    data: &Map<String, Value>,
    keys: (&'static str, &str),
) -> Result<Option<String>, ExtractionError> {
    match lookup(data, keys) {
        Some(Value::Object(_)) | Some(Value::Array(_)) => {
            Err(ExtractionError::NonScalarField(keys.0))
        }
        other => Ok(other.map(value_to_text)),
    }
}

fn read_list(data: &Map<String, Value>, keys: (&str, &str)) -> Vec<String> {
    match lookup(data, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(value_to_text)
            .collect(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(other) => vec![value_to_text(other)],
        None => Vec::new(),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::english::EnglishEnforcer;
    use crate::agent::vocabulary::Vocabulary;
    use std::sync::Arc;

    #[test]
    fn english_keys_are_read() {
        let record = normalize_candidate(
            r#"{"object":"chair","dimensions":"45cm","material":"wood","color":"green","style":"modern","modifications":["armrests"]}"#,
        )
        .unwrap();
        assert_eq!(record.object, "chair");
        assert_eq!(record.dimensions, "45cm");
        assert_eq!(record.modifications, vec!["armrests".to_string()]);
    }

    #[test]
    fn chinese_aliases_are_used_when_english_missing() {
        let record =
            normalize_candidate(r#"{"物体":"椅子","颜色":"绿色","修改":["加扶手"]}"#).unwrap();
        assert_eq!(record.object, "椅子");
        assert_eq!(record.color, "绿色");
        assert_eq!(record.modifications, vec!["加扶手".to_string()]);
    }

    #[test]
    fn english_key_takes_precedence_over_alias() {
        let record = normalize_candidate(r#"{"object":"table","物体":"椅子"}"#).unwrap();
        assert_eq!(record.object, "table");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let record = normalize_candidate(r#"{"color":"red"}"#).unwrap();
        assert_eq!(record.object, "object");
        assert_eq!(record.material, "");
        assert!(record.modifications.is_empty());
    }

    #[test]
    fn null_values_count_as_missing() {
        let record = normalize_candidate(r#"{"object":null,"物体":"sofa","style":null}"#).unwrap();
        assert_eq!(record.object, "sofa");
        assert_eq!(record.style, "");
    }

    #[test]
    fn scalar_values_are_stringified() {
        let record = normalize_candidate(r#"{"object":"box","dimensions":45,"modifications":"handles"}"#)
            .unwrap();
        assert_eq!(record.dimensions, "45");
        assert_eq!(record.modifications, vec!["handles".to_string()]);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = normalize_candidate("not json at all").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn non_object_json_is_an_error() {
        let err = normalize_candidate(r#"["chair"]"#).unwrap_err();
        assert!(matches!(err, ExtractionError::NotAnObject));
    }

    #[test]
    fn nested_object_field_is_an_error() {
        let err = normalize_candidate(r#"{"object":{"name":"chair","legs":4},"color":"green"}"#)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NonScalarField("object")));
    }

    #[test]
    fn array_material_or_style_is_an_error() {
        let err = normalize_candidate(r#"{"object":"chair","material":["wood"]}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::NonScalarField("material")));

        let err = normalize_candidate(r#"{"object":"chair","风格":{"era":"1960s"}}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::NonScalarField("style")));
    }

    #[test]
    fn nested_values_are_kept_in_unenforced_fields() {
        let record =
            normalize_candidate(r#"{"object":"desk","dimensions":{"w":120},"color":true}"#).unwrap();
        assert_eq!(record.dimensions, r#"{"w":120}"#);
        assert_eq!(record.color, "true");
    }

    #[test]
    fn normalizing_a_serialized_record_is_identity() {
        let record = StructuredObjectRecord {
            object: "lamp".to_string(),
            dimensions: "30cm".to_string(),
            material: "metal".to_string(),
            color: "yellow".to_string(),
            style: "industrial".to_string(),
            modifications: vec!["dimmer".to_string()],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(normalize_candidate(&json).unwrap(), record);
    }

    #[test]
    fn normalize_then_enforce_leaves_english_record_unchanged() {
        let enforcer = EnglishEnforcer::new(Arc::new(Vocabulary::default()));
        let record = StructuredObjectRecord {
            object: "bookshelf".to_string(),
            dimensions: "180cm tall".to_string(),
            material: "wooden".to_string(),
            color: "blue".to_string(),
            style: "minimalist".to_string(),
            modifications: vec!["glass doors".to_string(), "five shelves".to_string()],
        };

        let json = serde_json::to_string(&record).unwrap();
        let once = enforcer.enforce(normalize_candidate(&json).unwrap());
        assert_eq!(once, record);

        let again = enforcer.enforce(normalize_candidate(&serde_json::to_string(&once).unwrap()).unwrap());
        assert_eq!(again, record);
    }
}
