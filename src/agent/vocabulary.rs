use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::VocabularyError;
use crate::utils::text_file::load_text_file_with_guess_encoding;

/// One fallback category: an English primary keyword plus localized
/// secondary keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub primary: String,
    #[serde(default)]
    pub secondary: Vec<String>,
}

/// Bilingual lookup tables shared by the EnglishEnforcer and the
/// FallbackInferencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub glossary: HashMap<String, String>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

const DEFAULT_GLOSSARY: &[(&str, &str)] = &[
    // objects
    ("椅子", "chair"),
    ("桌子", "table"),
    ("沙发", "sofa"),
    ("床", "bed"),
    ("台灯", "lamp"),
    ("书架", "bookshelf"),
    ("花瓶", "vase"),
    ("雕塑", "sculpture"),
    // materials
    ("木质", "wooden"),
    ("金属", "metal"),
    ("塑料", "plastic"),
    ("玻璃", "glass"),
    // colors
    ("红色", "red"),
    ("绿色", "green"),
    ("蓝色", "blue"),
    ("黄色", "yellow"),
    // styles
    ("现代风格", "modern"),
    ("复古风格", "vintage"),
    ("工业风格", "industrial"),
    ("简约风格", "minimalist"),
    ("豪华风格", "luxury"),
];

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("chair", "椅子"),
    ("table", "桌子"),
    ("sofa", "沙发"),
    ("bed", "床"),
    ("lamp", "台灯"),
    ("bookshelf", "书架"),
    ("vase", "花瓶"),
    ("sculpture", "雕塑"),
];

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            glossary: DEFAULT_GLOSSARY
                .iter()
                .map(|(zh, en)| (zh.to_string(), en.to_string()))
                .collect(),
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|(name, secondary)| Category {
                    name: name.to_string(),
                    primary: name.to_string(),
                    secondary: vec![secondary.to_string()],
                })
                .collect(),
        }
    }
}

impl Vocabulary {
    /// Load tables from a YAML or JSON file (chosen by extension).
    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let content =
            load_text_file_with_guess_encoding(path).map_err(|source| VocabularyError::Read {
                path: path.display().to_string(),
                source,
            })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let vocabulary: Vocabulary = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        vocabulary.validate()?;

        info!(
            "Loaded vocabulary from {}: {} glossary entries, {} categories",
            path.display(),
            vocabulary.glossary.len(),
            vocabulary.categories.len()
        );
        Ok(vocabulary)
    }

    /// Built-in tables unless a path is configured.
    pub fn from_optional_path(path: Option<&str>) -> Result<Self, VocabularyError> {
        match path {
            Some(p) if !p.trim().is_empty() => Self::load(Path::new(p)),
            _ => Ok(Self::default()),
        }
    }

    pub fn translate(&self, term: &str) -> Option<&str> {
        self.glossary.get(term).map(String::as_str)
    }

    fn validate(&self) -> Result<(), VocabularyError> {
        for (index, category) in self.categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                return Err(VocabularyError::Invalid(format!(
                    "category #{} has an empty name",
                    index
                )));
            }
            if category.primary.trim().is_empty() {
                return Err(VocabularyError::Invalid(format!(
                    "category '{}' has an empty primary keyword",
                    category.name
                )));
            }
        }
        Ok(())
    }
}
