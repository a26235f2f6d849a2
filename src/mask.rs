//! Masking of suspect words in both working copies.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::suspects::SuspectToken;

/// Working copies with suspects replaced by the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedText {
    pub cleaned: String,
    pub original: String,
    /// Suspects that were actually masked, one per placeholder, in text order
    pub suspects: Vec<SuspectToken>,
}

/// Replace every whole-word occurrence of each suspect form with `placeholder`.
///
/// In `cleaned` a whole word is a whitespace-delimited token. In `original`,
/// which never went through the rewrite table, an occurrence counts when it is
/// bounded by non-alphanumeric characters or the text edges.
///
/// A form whose occurrence count differs between the two copies cannot be
/// paired up placeholder-for-placeholder, so it is left unmasked and its
/// suspect entries are dropped. The same happens when the masked forms
/// appear in a different left-to-right order in the two copies; the form at
/// the first disagreement in the cleaned copy is dropped until they agree.
/// Both returned copies therefore hold exactly `suspects.len()` placeholders,
/// with the i-th placeholder of each standing for the i-th suspect.
pub fn mask(cleaned: &str, original: &str, suspects: &[SuspectToken], placeholder: &str) -> MaskedText {
    let cleaned_spans = token_spans(cleaned);
    let mut cleaned_counts: HashMap<&str, usize> = HashMap::new();
    for &(start, end) in &cleaned_spans {
        *cleaned_counts.entry(&cleaned[start..end]).or_insert(0) += 1;
    }

    let mut active: HashSet<&str> = suspects.iter().map(|s| s.surface_form.as_str()).collect();
    let original_spans = loop {
        let spans = bounded_spans(original, &active);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for &(start, end) in &spans {
            *counts.entry(&original[start..end]).or_insert(0) += 1;
        }
        let mismatched: Vec<&str> = active
            .iter()
            .copied()
            .filter(|form| counts.get(form) != cleaned_counts.get(form))
            .collect();
        if mismatched.is_empty() {
            let cleaned_order = cleaned_spans
                .iter()
                .map(|&(start, end)| &cleaned[start..end])
                .filter(|token| active.contains(token));
            let original_order = spans.iter().map(|&(start, end)| &original[start..end]);
            let disagreement = cleaned_order.zip(original_order).find(|(a, b)| a != b);
            match disagreement {
                None => break spans,
                Some((form, other)) => {
                    warn!(form, other, "Suspect order differs between copies; leaving unmasked");
                    active.remove(form);
                    continue;
                }
            }
        }
        for form in mismatched {
            warn!(
                form,
                cleaned = cleaned_counts.get(form).copied().unwrap_or(0),
                original = counts.get(form).copied().unwrap_or(0),
                "Suspect occurrences differ between copies; leaving unmasked"
            );
            active.remove(form);
        }
    };

    let masked_cleaned = splice(
        cleaned,
        cleaned_spans
            .into_iter()
            .filter(|&(start, end)| active.contains(&cleaned[start..end])),
        placeholder,
    );
    let masked_original = splice(original, original_spans.into_iter(), placeholder);
    let kept: Vec<SuspectToken> = suspects
        .iter()
        .filter(|s| active.contains(s.surface_form.as_str()))
        .cloned()
        .collect();

    debug!(masked = kept.len(), dropped = suspects.len() - kept.len(), "Masked suspects");
    MaskedText {
        cleaned: masked_cleaned,
        original: masked_original,
        suspects: kept,
    }
}

/// Byte ranges of whitespace-delimited tokens.
fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Non-overlapping occurrences of the forms bounded by non-alphanumerics.
fn bounded_spans(text: &str, forms: &HashSet<&str>) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = forms
        .iter()
        .flat_map(move |form| {
            text.match_indices(*form)
                .map(|(start, m)| (start, start + m.len()))
                .filter(move |&(start, end)| {
                    let before = text[..start].chars().next_back();
                    let after = text[end..].chars().next();
                    before.is_none_or(|c| !c.is_alphanumeric())
                        && after.is_none_or(|c| !c.is_alphanumeric())
                })
        })
        .collect();
    // Earliest first, longest first at the same start
    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut resolved = Vec::with_capacity(spans.len());
    let mut last_end = 0;
    for (start, end) in spans {
        if start >= last_end {
            resolved.push((start, end));
            last_end = end;
        }
    }
    resolved
}

fn splice(text: &str, spans: impl Iterator<Item = (usize, usize)>, placeholder: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in spans {
        out.push_str(&text[cursor..start]);
        out.push_str(placeholder);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    const MASK: &str = "[MASK]";

    fn suspect(form: &str) -> SuspectToken {
        SuspectToken {
            surface_form: form.to_string(),
            suggestions: Vec::new(),
        }
    }

    /// Put each suspect back into its placeholder, left to right.
    fn unmask(masked: &str, suspects: &[SuspectToken]) -> String {
        let mut out = String::new();
        let mut rest = masked;
        for suspect in suspects {
            let at = rest.find(MASK).expect("placeholder for every suspect");
            out.push_str(&rest[..at]);
            out.push_str(&suspect.surface_form);
            rest = &rest[at + MASK.len()..];
        }
        assert!(!rest.contains(MASK), "more placeholders than suspects in {:?}", masked);
        out.push_str(rest);
        out
    }

    #[test]
    fn test_masks_both_copies() {
        let masked = mask(
            "argued the resuts are robust . ",
            "argued the resuts are robust.",
            &[suspect("resuts")],
            MASK,
        );
        assert_eq!(masked.cleaned, "argued the [MASK] are robust . ");
        assert_eq!(masked.original, "argued the [MASK] are robust.");
        assert_eq!(masked.suspects.len(), 1);
    }

    #[test]
    fn test_never_masks_inside_other_words() {
        let masked = mask("th then other", "th then other.", &[suspect("th")], MASK);
        assert_eq!(masked.cleaned, "[MASK] then other");
        assert_eq!(masked.original, "[MASK] then other.");
    }

    #[test]
    fn test_placeholder_counts_match_suspects() {
        let suspects = [suspect("resuts"), suspect("rn3ssy"), suspect("resuts")];
        let masked = mask(
            "the resuts ,  and rn3ssy resuts . ",
            "the resuts, and rn3ssy resuts.",
            &suspects,
            MASK,
        );
        assert_eq!(masked.cleaned.matches(MASK).count(), 3);
        assert_eq!(masked.original.matches(MASK).count(), 3);
        assert_eq!(masked.suspects, suspects.to_vec());
        assert_eq!(masked.original, "the [MASK], and [MASK] [MASK].");
    }

    #[test]
    fn test_drops_forms_missing_from_original() {
        // `can't` becomes `ca not` in the cleaned copy only
        let suspects = [suspect("ca"), suspect("resuts")];
        let masked = mask("I ca not see resuts", "I can't see resuts", &suspects, MASK);
        assert_eq!(masked.cleaned, "I ca not see [MASK]");
        assert_eq!(masked.original, "I can't see [MASK]");
        assert_eq!(masked.suspects, vec![suspect("resuts")]);
    }

    #[test]
    fn test_placeholders_follow_suspect_order_through_rewrites() {
        let working = normalize("thay'll fnd the dgs' bon, thay sed", false);
        let suspects: Vec<SuspectToken> = ["thay", "fnd", "dgs", "bon", "thay", "sed"]
            .into_iter()
            .map(suspect)
            .collect();
        let masked = mask(&working.cleaned, &working.original, &suspects, MASK);

        assert_eq!(masked.suspects, suspects);
        assert_eq!(unmask(&masked.cleaned, &masked.suspects), working.cleaned);
        assert_eq!(unmask(&masked.original, &masked.suspects), working.original);
    }

    #[test]
    fn test_drops_forms_whose_order_differs() {
        // `xan't` adds an `xa` token to the cleaned copy; `xa\"` keeps a
        // bounded `xa` in the original only, so counts agree but order flips
        let working = normalize(r#"I xan't see zz and say xa\" ok"#, false);
        assert_eq!(working.cleaned, r#"I xa not see zz and say xa" ok"#);

        let masked = mask(&working.cleaned, &working.original, &[suspect("xa"), suspect("zz")], MASK);
        assert_eq!(masked.suspects, vec![suspect("zz")]);
        assert_eq!(masked.cleaned, r#"I xa not see [MASK] and say xa" ok"#);
        assert_eq!(masked.original, r#"I xan't see [MASK] and say xa\" ok"#);
        assert_eq!(unmask(&masked.original, &masked.suspects), working.original);
        assert_eq!(unmask(&masked.cleaned, &masked.suspects), working.cleaned);
    }

    #[test]
    fn test_hyphenated_original() {
        let masked = mask("well resuts", "well-resuts", &[suspect("resuts")], MASK);
        assert_eq!(masked.original, "well-[MASK]");
    }

    #[test]
    fn test_no_suspects_is_identity() {
        let masked = mask("a b . ", "a b.", &[], MASK);
        assert_eq!(masked.cleaned, "a b . ");
        assert_eq!(masked.original, "a b.");
        assert!(masked.suspects.is_empty());
    }
}
