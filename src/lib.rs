//! OCR text correction.
//!
//! Text pulled from a scanned document (by OCR, or from its native text layer
//! when that is trustworthy) is normalized, spell-checked, and every suspect
//! word is masked and refilled by a masked language model. The model's
//! candidates are reconciled against the dictionary's suggestions by string
//! similarity.
//!
//! The dictionary, name tagger, tokenizer and model are loaded once into a
//! [`Corrector`] and reused across documents.

pub mod config;
pub mod dictionary;
pub mod error;
pub mod extract;
pub mod mask;
pub mod names;
pub mod normalize;
pub mod pipeline;
pub mod predict;
pub mod reconcile;
pub mod similarity;
pub mod suspects;

#[cfg(feature = "hf-tokenizer")]
pub mod hf;

#[cfg(feature = "python")]
mod python;

pub use config::{CorrectorConfig, EmptySuggestionPolicy, OverflowPolicy};
pub use dictionary::{MultiLangDict, SpellDictionary};
pub use error::{CorrectionError, CorrectionResult};
pub use extract::{
    Extraction, ExtractionGate, ExtractionResult, OcrEngine, OcrMyPdf, OcrRequest, PdfToText,
    TextLayerExtractor, TextSource,
};
pub use names::{EntityTagger, GazetteerTagger};
pub use pipeline::{Correction, Corrector, DocumentCorrection, SourceCorrection};
pub use predict::{MaskedLanguageModel, SubwordTokenizer};
pub use reconcile::FinalReplacement;
