//! Pipeline configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CorrectionError, CorrectionResult};

/// What to substitute when no model candidate scored against any suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySuggestionPolicy {
    /// Fill the placeholder with an empty string.
    #[default]
    Blank,
    /// Fill the placeholder with the model's highest-scoring candidate.
    TopCandidate,
}

/// How to handle token sequences longer than the model's context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Abort the text source with `ContextOverflow`.
    #[default]
    Fail,
    /// Run inference over sentence-aligned windows that each fit.
    Window,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    /// Native text with this many words or fewer is treated as unreliable
    pub min_words: usize,
    /// Tesseract language codes handed to the OCR engine
    pub ocr_languages: Vec<String>,
    /// Extra arguments for unpaper during OCR cleanup
    pub unpaper_args: Option<String>,
    /// Append the detected native-text language to the OCR languages
    pub auto_ocr_language: bool,
    pub strip_citations: bool,
    /// Token standing in for a suspect word; must be a single model token
    pub placeholder: String,
    /// Candidates taken per placeholder from the model
    pub top_k: usize,
    pub max_suggestions: usize,
    /// Directory holding `<lang>.aff`/`<lang>.dic` or `<lang>_words.txt`
    pub dictionary_dir: PathBuf,
    pub dictionary_languages: Vec<String>,
    /// Person names (one per line) protected from correction
    pub names_file: Option<PathBuf>,
    pub empty_suggestion: EmptySuggestionPolicy,
    pub overflow: OverflowPolicy,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            min_words: 10,
            ocr_languages: vec!["eng".to_string()],
            unpaper_args: None,
            auto_ocr_language: false,
            strip_citations: true,
            placeholder: "[MASK]".to_string(),
            top_k: 50,
            max_suggestions: 10,
            dictionary_dir: PathBuf::from("dictionaries"),
            dictionary_languages: vec!["en_US".to_string()],
            names_file: None,
            empty_suggestion: EmptySuggestionPolicy::default(),
            overflow: OverflowPolicy::default(),
        }
    }
}

impl CorrectorConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> CorrectionResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| CorrectionError::Config {
            message: format!("Invalid config JSON: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> CorrectionResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> CorrectionResult<()> {
        let fail = |message: &str| {
            Err(CorrectionError::Config {
                message: message.to_string(),
            })
        };
        if self.top_k == 0 {
            return fail("top_k must be at least 1");
        }
        if self.placeholder.is_empty() || self.placeholder.chars().any(char::is_whitespace) {
            return fail("placeholder must be a non-empty token without whitespace");
        }
        if self.ocr_languages.is_empty() {
            return fail("at least one OCR language is required");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_settings() {
        let config = CorrectorConfig::default();
        assert_eq!(config.min_words, 10);
        assert_eq!(config.top_k, 50);
        assert_eq!(config.placeholder, "[MASK]");
        assert_eq!(config.ocr_languages, vec!["eng"]);
        assert!(config.strip_citations);
        assert_eq!(config.empty_suggestion, EmptySuggestionPolicy::Blank);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CorrectorConfig::from_json_str(
            r#"{"min_words": 25, "empty_suggestion": "top_candidate", "overflow": "window"}"#,
        )
        .unwrap();
        assert_eq!(config.min_words, 25);
        assert_eq!(config.empty_suggestion, EmptySuggestionPolicy::TopCandidate);
        assert_eq!(config.overflow, OverflowPolicy::Window);
        assert_eq!(config.top_k, 50);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(CorrectorConfig::from_json_str(r#"{"top_k": 0}"#).is_err());
        assert!(CorrectorConfig::from_json_str(r#"{"placeholder": "[ MASK ]"}"#).is_err());
        assert!(CorrectorConfig::from_json_str(r#"{"ocr_languages": []}"#).is_err());
        assert!(CorrectorConfig::from_json_str("not json").is_err());
    }
}
