//! Reconciliation of model candidates with dictionary suggestions.

use tracing::{debug, warn};

use crate::config::EmptySuggestionPolicy;
use crate::error::{CorrectionError, CorrectionResult};
use crate::similarity::sequence_ratio;
use crate::suspects::SuspectToken;

/// The token chosen for one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReplacement {
    /// Placeholder ordinal, left to right
    pub index: usize,
    pub suspect: String,
    pub replacement: String,
    /// Best similarity between the replacement and any suggestion
    pub score: f64,
    /// No candidate scored above zero (e.g. the suspect had no suggestions)
    pub unscored: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub text: String,
    pub replacements: Vec<FinalReplacement>,
}

/// Model candidate most similar to any suggestion, with its score.
///
/// Only a strictly higher score replaces the current best, so ties keep the
/// earlier candidate. Returns `None` when nothing scores above zero.
pub fn best_candidate<'a>(candidates: &'a [String], suggestions: &[String]) -> (Option<&'a str>, f64) {
    let mut best = None;
    let mut best_score = 0.0;
    for candidate in candidates {
        for suggestion in suggestions {
            let score = sequence_ratio(candidate, suggestion);
            if score > best_score {
                best_score = score;
                best = Some(candidate.as_str());
            }
        }
    }
    (best, best_score)
}

/// Fill each placeholder of `masked_original`, left to right, one at a time.
///
/// `candidates[i]` and `suspects[i]` belong to the i-th placeholder.
pub fn reconcile(
    candidates: &[Vec<String>],
    suspects: &[SuspectToken],
    masked_original: &str,
    placeholder: &str,
    policy: EmptySuggestionPolicy,
) -> CorrectionResult<Reconciled> {
    if candidates.len() != suspects.len() {
        return Err(CorrectionError::Desync {
            expected: suspects.len(),
            found: candidates.len(),
        });
    }

    let mut text = String::with_capacity(masked_original.len());
    let mut rest = masked_original;
    let mut replacements = Vec::with_capacity(suspects.len());
    for (index, (set, suspect)) in candidates.iter().zip(suspects).enumerate() {
        let (best, score) = best_candidate(set, &suspect.suggestions);
        let replacement = match (best, policy) {
            (Some(token), _) => token,
            (None, EmptySuggestionPolicy::Blank) => "",
            (None, EmptySuggestionPolicy::TopCandidate) => set.first().map(String::as_str).unwrap_or(""),
        };
        if best.is_none() {
            warn!(suspect = %suspect.surface_form, ?policy, "No candidate matched a suggestion");
        }

        let Some(at) = rest.find(placeholder) else {
            return Err(CorrectionError::Desync {
                expected: suspects.len(),
                found: index,
            });
        };
        text.push_str(&rest[..at]);
        text.push_str(replacement);
        rest = &rest[at + placeholder.len()..];

        debug!(suspect = %suspect.surface_form, replacement, score, "Chose replacement");
        replacements.push(FinalReplacement {
            index,
            suspect: suspect.surface_form.clone(),
            replacement: replacement.to_string(),
            score,
            unscored: best.is_none(),
        });
    }
    text.push_str(rest);

    Ok(Reconciled { text, replacements })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASK: &str = "[MASK]";

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn suspect(form: &str, suggestions: &[&str]) -> SuspectToken {
        SuspectToken {
            surface_form: form.to_string(),
            suggestions: strings(suggestions),
        }
    }

    #[test]
    fn test_picks_candidate_closest_to_suggestions() {
        let candidates = strings(&["resets", "results", "rest"]);
        let (best, score) = best_candidate(&candidates, &strings(&["results", "rests"]));
        assert_eq!(best, Some("results"));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let candidates = strings(&["cat", "bat"]);
        assert_eq!(best_candidate(&candidates, &strings(&["hat"])).0, Some("cat"));
    }

    #[test]
    fn test_fills_every_placeholder() {
        let reconciled = reconcile(
            &[strings(&["results", "reports"]), strings(&["robust", "rubbish"])],
            &[suspect("resuts", &["results"]), suspect("robst", &["robust"])],
            "the [MASK] are [MASK].",
            MASK,
            EmptySuggestionPolicy::Blank,
        )
        .unwrap();
        assert_eq!(reconciled.text, "the results are robust.");
        assert!(!reconciled.text.contains(MASK));
        assert_eq!(reconciled.replacements.len(), 2);
        assert!(reconciled.replacements.iter().all(|r| !r.unscored));
    }

    #[test]
    fn test_empty_suggestions_blank_by_default() {
        let reconciled = reconcile(
            &[strings(&["messy", "mess"])],
            &[suspect("rn3ssy", &[])],
            "a [MASK] page",
            MASK,
            EmptySuggestionPolicy::Blank,
        )
        .unwrap();
        assert_eq!(reconciled.text, "a  page");
        assert_eq!(reconciled.replacements[0].replacement, "");
        assert!(reconciled.replacements[0].unscored);
        assert_eq!(reconciled.replacements[0].score, 0.0);
    }

    #[test]
    fn test_empty_suggestions_top_candidate_policy() {
        let reconciled = reconcile(
            &[strings(&["messy", "mess"])],
            &[suspect("rn3ssy", &[])],
            "a [MASK] page",
            MASK,
            EmptySuggestionPolicy::TopCandidate,
        )
        .unwrap();
        assert_eq!(reconciled.text, "a messy page");
        assert!(reconciled.replacements[0].unscored);
    }

    #[test]
    fn test_replacement_equal_to_placeholder_not_refilled() {
        let reconciled = reconcile(
            &[strings(&[MASK]), strings(&["b"])],
            &[suspect("x", &[MASK]), suspect("y", &["b"])],
            "[MASK] and [MASK]",
            MASK,
            EmptySuggestionPolicy::Blank,
        )
        .unwrap();
        assert_eq!(reconciled.text, "[MASK] and b");
    }

    #[test]
    fn test_length_mismatch_is_desync() {
        let err = reconcile(
            &[strings(&["a"])],
            &[suspect("x", &["a"]), suspect("y", &["b"])],
            "[MASK] [MASK]",
            MASK,
            EmptySuggestionPolicy::Blank,
        )
        .unwrap_err();
        assert!(matches!(err, CorrectionError::Desync { expected: 2, found: 1 }));
    }

    #[test]
    fn test_missing_placeholder_is_desync() {
        let err = reconcile(
            &[strings(&["a"])],
            &[suspect("x", &["a"])],
            "no placeholder here",
            MASK,
            EmptySuggestionPolicy::Blank,
        )
        .unwrap_err();
        assert!(matches!(err, CorrectionError::Desync { expected: 1, found: 0 }));
    }
}
