use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of CJK ideographs above which a text counts as Chinese.
const CJK_RATIO_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Zh,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// True for characters in the CJK Unified Ideographs block.
pub fn is_cjk(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}

/// Classify text as Chinese- or English-dominant by CJK character ratio.
/// Empty or whitespace-only text is English.
pub fn detect_language(text: &str) -> Language {
    if text.trim().is_empty() {
        return Language::En;
    }

    let total = text.chars().count();
    let cjk = text.chars().filter(|c| is_cjk(*c)).count();

    if cjk as f64 / total as f64 > CJK_RATIO_THRESHOLD {
        Language::Zh
    } else {
        Language::En
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_sentence_is_zh() {
        assert_eq!(detect_language("椅子很漂亮"), Language::Zh);
    }

    #[test]
    fn english_sentence_is_en() {
        assert_eq!(detect_language("a green chair"), Language::En);
    }

    #[test]
    fn ratio_exactly_at_threshold_is_en() {
        // 3 ideographs out of 10 characters
        assert_eq!(detect_language("椅子很abcdefg"), Language::En);
    }

    #[test]
    fn ratio_just_above_threshold_is_zh() {
        // 4 ideographs out of 10 characters
        assert_eq!(detect_language("绿色椅子abcdef"), Language::Zh);
    }

    #[test]
    fn empty_and_blank_default_to_en() {
        assert_eq!(detect_language(""), Language::En);
        assert_eq!(detect_language("   \t"), Language::En);
    }

    #[test]
    fn display_uses_language_code() {
        assert_eq!(Language::Zh.to_string(), "zh");
        assert_eq!(Language::En.to_string(), "en");
    }
}
