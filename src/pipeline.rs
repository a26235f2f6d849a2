//! The correction pipeline: one long-lived handle over the loaded collaborators.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};
use whatlang::Lang;

use crate::config::CorrectorConfig;
use crate::dictionary::{MultiLangDict, SpellDictionary};
use crate::error::CorrectionResult;
use crate::extract::{Extraction, ExtractionGate, ExtractionResult, TextSource};
use crate::mask::mask;
use crate::names::{EntityTagger, GazetteerTagger};
use crate::normalize::normalize;
use crate::predict::{predict_candidates, MaskedLanguageModel, PredictOptions, SubwordTokenizer};
use crate::reconcile::{reconcile, FinalReplacement};
use crate::suspects::select_suspects;

/// Corrected text for one text source.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub text: String,
    pub replacements: Vec<FinalReplacement>,
    pub person_names: HashSet<String>,
    /// Suspects left unmasked because their forms could not be paired up
    pub dropped_suspects: usize,
}

/// Outcome for one text source of a document.
#[derive(Debug)]
pub struct SourceCorrection {
    pub source: TextSource,
    pub language: Option<Lang>,
    pub result: CorrectionResult<Correction>,
}

impl SourceCorrection {
    pub fn text(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|c| c.text.as_str())
    }
}

/// Outcome for a whole document; each source succeeds or fails on its own.
#[derive(Debug)]
pub struct DocumentCorrection {
    pub ocr: SourceCorrection,
    pub native: Option<SourceCorrection>,
}

impl DocumentCorrection {
    /// Corrected texts that succeeded, OCR first.
    pub fn texts(&self) -> Vec<&str> {
        std::iter::once(&self.ocr)
            .chain(self.native.as_ref())
            .filter_map(SourceCorrection::text)
            .collect()
    }
}

/// Loaded dictionary, tagger, tokenizer and model, reused across documents.
pub struct Corrector {
    config: CorrectorConfig,
    dictionary: Box<dyn SpellDictionary>,
    tagger: Box<dyn EntityTagger>,
    tokenizer: Box<dyn SubwordTokenizer>,
    model: Box<dyn MaskedLanguageModel>,
}

impl Corrector {
    pub fn new(
        config: CorrectorConfig,
        dictionary: Box<dyn SpellDictionary>,
        tagger: Box<dyn EntityTagger>,
        tokenizer: Box<dyn SubwordTokenizer>,
        model: Box<dyn MaskedLanguageModel>,
    ) -> CorrectionResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dictionary,
            tagger,
            tokenizer,
            model,
        })
    }

    /// Load the dictionary and name list named by `config`.
    pub fn from_config(
        config: CorrectorConfig,
        tokenizer: Box<dyn SubwordTokenizer>,
        model: Box<dyn MaskedLanguageModel>,
    ) -> CorrectionResult<Self> {
        let dictionary = MultiLangDict::load(&config.dictionary_dir, &config.dictionary_languages)?
            .with_max_suggestions(config.max_suggestions);
        let tagger = match &config.names_file {
            Some(path) => {
                let tagger = GazetteerTagger::load_from_file(path)?;
                info!(names = tagger.len(), path = %path.display(), "Loaded person names");
                tagger
            }
            None => GazetteerTagger::default(),
        };
        Self::new(config, Box::new(dictionary), Box::new(tagger), tokenizer, model)
    }

    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    /// Run normalization through reconciliation over one text.
    pub fn correct_text(&self, text: &str) -> CorrectionResult<Correction> {
        let placeholder = self.config.placeholder.as_str();
        let working = normalize(text, self.config.strip_citations);
        let selection = select_suspects(&working.cleaned, self.dictionary.as_ref(), self.tagger.as_ref());
        let masked = mask(&working.cleaned, &working.original, &selection.suspects, placeholder);

        let prediction = predict_candidates(
            &masked.cleaned,
            masked.suspects.len(),
            self.tokenizer.as_ref(),
            self.model.as_ref(),
            PredictOptions {
                placeholder,
                top_k: self.config.top_k,
                overflow: self.config.overflow,
            },
        )?;
        let reconciled = reconcile(
            &prediction.candidates,
            &masked.suspects,
            &masked.original,
            placeholder,
            self.config.empty_suggestion,
        )?;

        Ok(Correction {
            text: reconciled.text,
            replacements: reconciled.replacements,
            person_names: selection.person_names,
            dropped_suspects: selection.suspects.len() - masked.suspects.len(),
        })
    }

    /// Correct every source of an extraction independently.
    pub fn correct_extraction(&self, extraction: &Extraction) -> DocumentCorrection {
        DocumentCorrection {
            ocr: self.correct_source(&extraction.ocr),
            native: extraction.native.as_ref().map(|n| self.correct_source(n)),
        }
    }

    /// Extract a document through `gate`, then correct each source.
    ///
    /// Only extraction failures are returned as `Err`; correction failures
    /// are reported per source.
    pub fn correct_document(
        &self,
        gate: &ExtractionGate,
        input: &Path,
        workdir: &Path,
    ) -> CorrectionResult<DocumentCorrection> {
        let extraction = gate.extract(input, workdir)?;
        Ok(self.correct_extraction(&extraction))
    }

    fn correct_source(&self, extracted: &ExtractionResult) -> SourceCorrection {
        let result = self.correct_text(&extracted.text);
        match &result {
            Ok(correction) => info!(
                source = ?extracted.source,
                replacements = correction.replacements.len(),
                dropped = correction.dropped_suspects,
                "Corrected text source"
            ),
            Err(e) => warn!(source = ?extracted.source, error = %e, "Text source failed"),
        }
        SourceCorrection {
            source: extracted.source,
            language: extracted.language,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CorrectionError;
    use std::fs;

    struct NoTokens;

    impl SubwordTokenizer for NoTokens {
        fn tokenize(&self, text: &str) -> CorrectionResult<Vec<String>> {
            Ok(text.split_whitespace().map(str::to_string).collect())
        }

        fn ids_for(&self, tokens: &[String]) -> Vec<u32> {
            vec![0; tokens.len()]
        }

        fn tokens_for(&self, ids: &[u32]) -> Vec<String> {
            ids.iter().map(|_| "the".to_string()).collect()
        }
    }

    struct FlatModel;

    impl MaskedLanguageModel for FlatModel {
        fn max_positions(&self) -> usize {
            512
        }

        fn infer(&self, token_ids: &[u32], _segment_ids: &[u32]) -> CorrectionResult<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]; token_ids.len()])
        }
    }

    #[test]
    fn test_from_config_loads_word_list_and_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en_words.txt"), "the\nwrote\n").unwrap();
        let names = dir.path().join("names.txt");
        fs::write(&names, "# people\nDlamini\n").unwrap();
        let config = CorrectorConfig {
            dictionary_dir: dir.path().to_path_buf(),
            dictionary_languages: vec!["en".to_string()],
            names_file: Some(names),
            ..CorrectorConfig::default()
        };

        let corrector = Corrector::from_config(config, Box::new(NoTokens), Box::new(FlatModel)).unwrap();
        let correction = corrector.correct_text("Dlamini wrote the").unwrap();
        assert_eq!(correction.text, "Dlamini wrote the");
        assert!(correction.person_names.contains("Dlamini"));
        assert!(correction.replacements.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CorrectorConfig {
            top_k: 0,
            ..CorrectorConfig::default()
        };
        let result = Corrector::new(
            config,
            Box::new(MultiLangDict::default()),
            Box::new(GazetteerTagger::default()),
            Box::new(NoTokens),
            Box::new(FlatModel),
        );
        assert!(matches!(result, Err(CorrectionError::Config { .. })));
    }
}
