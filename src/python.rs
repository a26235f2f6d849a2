//! Python bindings for the model-independent pipeline stages.
//!
//! A Python caller runs its own masked language model between `SpellScreen.mask`
//! and `reconcile_text`.

use std::path::Path;

use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::config::EmptySuggestionPolicy;
use crate::dictionary::{MultiLangDict, SpellDictionary};
use crate::error::CorrectionError;
use crate::extract::count_words;
use crate::names::GazetteerTagger;
use crate::normalize::{normalize, strip_citations};
use crate::predict;
use crate::reconcile::reconcile;
use crate::similarity::sequence_ratio;
use crate::suspects::{self, SuspectToken};

impl From<CorrectionError> for PyErr {
    fn from(err: CorrectionError) -> Self {
        match err {
            CorrectionError::FatalExtraction { .. } | CorrectionError::Io(_) => {
                PyIOError::new_err(err.to_string())
            }
            CorrectionError::Config { .. } => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

type SuspectTuple = (String, Vec<String>);

fn to_tuples(suspects: Vec<SuspectToken>) -> Vec<SuspectTuple> {
    suspects
        .into_iter()
        .map(|s| (s.surface_form, s.suggestions))
        .collect()
}

fn from_tuples(suspects: Vec<SuspectTuple>) -> Vec<SuspectToken> {
    suspects
        .into_iter()
        .map(|(surface_form, suggestions)| SuspectToken {
            surface_form,
            suggestions,
        })
        .collect()
}

/// Normalize extracted text
/// Returns: (cleaned, original)
#[pyfunction]
#[pyo3(signature = (text, strip_citations = true))]
fn normalize_text(text: String, strip_citations: bool) -> PyResult<(String, String)> {
    let working = normalize(&text, strip_citations);
    Ok((working.cleaned, working.original))
}

/// Remove author/year citations
#[pyfunction]
fn remove_citations(text: String) -> PyResult<String> {
    Ok(strip_citations(&text))
}

/// Word count used to judge a native text layer, over all pages
#[pyfunction]
fn native_word_count(pages: Vec<String>) -> PyResult<usize> {
    Ok(count_words(&pages.join(" ")))
}

#[pyfunction]
fn similarity(a: String, b: String) -> PyResult<f64> {
    Ok(sequence_ratio(&a, &b))
}

#[pyfunction]
fn segment_ids(tokens: Vec<String>) -> PyResult<Vec<u32>> {
    Ok(predict::segment_ids(&tokens))
}

/// Fill the placeholders of a masked original text
/// `suspects` pairs each placeholder with (surface_form, suggestions)
#[pyfunction]
#[pyo3(signature = (candidates, suspects, masked_original, placeholder = "[MASK]", top_candidate_fallback = false))]
fn reconcile_text(
    candidates: Vec<Vec<String>>,
    suspects: Vec<SuspectTuple>,
    masked_original: String,
    placeholder: &str,
    top_candidate_fallback: bool,
) -> PyResult<String> {
    let policy = if top_candidate_fallback {
        EmptySuggestionPolicy::TopCandidate
    } else {
        EmptySuggestionPolicy::Blank
    };
    let reconciled = reconcile(
        &candidates,
        &from_tuples(suspects),
        &masked_original,
        placeholder,
        policy,
    )?;
    Ok(reconciled.text)
}

/// Dictionary plus name list, loaded once
#[pyclass]
struct SpellScreen {
    dictionary: MultiLangDict,
    tagger: GazetteerTagger,
}

#[pymethods]
impl SpellScreen {
    #[new]
    #[pyo3(signature = (dict_dir, languages, names = None, max_suggestions = 10))]
    fn new(
        dict_dir: String,
        languages: Vec<String>,
        names: Option<Vec<String>>,
        max_suggestions: usize,
    ) -> PyResult<Self> {
        let dictionary =
            MultiLangDict::load(Path::new(&dict_dir), &languages)?.with_max_suggestions(max_suggestions);
        Ok(Self {
            dictionary,
            tagger: GazetteerTagger::new(names.unwrap_or_default()),
        })
    }

    fn check(&self, word: &str) -> bool {
        self.dictionary.check(word)
    }

    fn suggest(&self, word: &str) -> Vec<String> {
        self.dictionary.suggest(word)
    }

    /// Returns: (person_names, [(surface_form, suggestions)])
    fn select_suspects(&self, cleaned: &str) -> (Vec<String>, Vec<SuspectTuple>) {
        let selection = suspects::select_suspects(cleaned, &self.dictionary, &self.tagger);
        let mut names: Vec<String> = selection.person_names.into_iter().collect();
        names.sort();
        (names, to_tuples(selection.suspects))
    }

    /// Returns: (masked_cleaned, masked_original, kept suspects)
    #[pyo3(signature = (cleaned, original, suspects, placeholder = "[MASK]"))]
    fn mask(
        &self,
        cleaned: &str,
        original: &str,
        suspects: Vec<SuspectTuple>,
        placeholder: &str,
    ) -> (String, String, Vec<SuspectTuple>) {
        let masked = crate::mask::mask(cleaned, original, &from_tuples(suspects), placeholder);
        (masked.cleaned, masked.original, to_tuples(masked.suspects))
    }

    fn stats(&self) -> String {
        self.dictionary.stats()
    }
}

#[pymodule]
fn rust_ocr_correct(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(normalize_text, m)?)?;
    m.add_function(wrap_pyfunction!(remove_citations, m)?)?;
    m.add_function(wrap_pyfunction!(native_word_count, m)?)?;
    m.add_function(wrap_pyfunction!(similarity, m)?)?;
    m.add_function(wrap_pyfunction!(segment_ids, m)?)?;
    m.add_function(wrap_pyfunction!(reconcile_text, m)?)?;
    m.add_class::<SpellScreen>()?;
    Ok(())
}
