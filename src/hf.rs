//! [`SubwordTokenizer`] over a Hugging Face `tokenizer.json`.

use std::path::Path;

use tokenizers::Tokenizer;
use tracing::info;

use crate::error::{CorrectionError, CorrectionResult};
use crate::predict::SubwordTokenizer;

const UNKNOWN_TOKEN: &str = "[UNK]";

pub struct HfTokenizer {
    inner: Tokenizer,
    unknown_id: u32,
}

impl HfTokenizer {
    pub fn from_file(path: &Path) -> CorrectionResult<Self> {
        let inner = Tokenizer::from_file(path).map_err(|e| {
            CorrectionError::model(format!("Failed to load tokenizer {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), vocab = inner.get_vocab_size(true), "Loaded tokenizer");
        Ok(Self::new(inner))
    }

    pub fn new(inner: Tokenizer) -> Self {
        let unknown_id = inner.token_to_id(UNKNOWN_TOKEN).unwrap_or(0);
        Self { inner, unknown_id }
    }
}

impl SubwordTokenizer for HfTokenizer {
    fn tokenize(&self, text: &str) -> CorrectionResult<Vec<String>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| CorrectionError::model(format!("Tokenization failed: {}", e)))?;
        Ok(encoding.get_tokens().to_vec())
    }

    fn ids_for(&self, tokens: &[String]) -> Vec<u32> {
        tokens
            .iter()
            .map(|t| self.inner.token_to_id(t).unwrap_or(self.unknown_id))
            .collect()
    }

    fn tokens_for(&self, ids: &[u32]) -> Vec<String> {
        ids.iter()
            .map(|&id| {
                self.inner
                    .id_to_token(id)
                    .unwrap_or_else(|| UNKNOWN_TOKEN.to_string())
            })
            .collect()
    }
}
