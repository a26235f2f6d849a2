//! Text normalization ahead of spell-checking.
//!
//! Produces two copies of an extracted text: `original`, which only loses
//! citations and ellipses and is what the reader finally sees, and `cleaned`,
//! which additionally goes through a punctuation rewrite table so that it
//! splits into clean tokens for the dictionary and the tokenizer.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Character/substring rewrites applied to the cleaned copy.
const REWRITES: &[(&str, &str)] = &[
    ("\\\"", "\""),
    ("n't", " not"),
    ("'ll", " will"),
    ("s'", "s '"),
    ("\n", " "),
    ("\\", " "),
    ("\"", " \" "),
    ("\u{201C}", " \" "),
    ("\u{201D}", " \" "),
    ("-", " "),
    (",", " , "),
    (".", " . "),
    ("!", " ! "),
    ("?", " ? "),
    ("*", " * "),
    ("(", " ( "),
    (")", " ) "),
];

lazy_static! {
    // Author[, Author...][, ](Year[, p. N] | (Year[, p. N]))
    static ref CITATION: Regex = {
        let author = r"(?:[A-Z][A-Za-z'`-]+)";
        let etal = r"(?:et al\.?)";
        let additional = format!(r"(?:,? (?:(?:and |& )?{author}|{etal}))");
        let year_num = r"(?:19|20)[0-9][0-9]";
        let page_num = r"(?:, p\.? [0-9]+)?";
        let year = format!(r"(?:, *{year_num}{page_num}| *\({year_num}{page_num}\))");
        Regex::new(&format!(r"{author}{additional}*{year}[ \t]*")).unwrap()
    };

    // Longest keys first so the alternation prefers `\"` over `\` and `n't` over nothing.
    static ref REWRITE_PATTERN: Regex = {
        let mut keys: Vec<&str> = REWRITES.iter().map(|(k, _)| *k).collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));
        let alternation: Vec<String> = keys.iter().map(|k| regex::escape(k)).collect();
        Regex::new(&alternation.join("|")).unwrap()
    };

    static ref REWRITE_TABLE: HashMap<&'static str, &'static str> =
        REWRITES.iter().cloned().collect();
}

/// The pair of texts carried through normalization and masking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingText {
    /// Tokenization-ready copy
    pub cleaned: String,
    /// Reader-facing copy
    pub original: String,
}

/// Normalize extracted text into its cleaned and original copies.
pub fn normalize(text: &str, strip: bool) -> WorkingText {
    let text = if strip {
        strip_citations(text)
    } else {
        text.to_string()
    };
    let original = collapse_ellipses(&text);
    let cleaned = rewrite(&original);
    WorkingText { cleaned, original }
}

/// Remove author/year citations such as `Smith, 2020` or `Brown et al. (2019, p. 4)`.
///
/// Removing one citation can join its neighbours into another
/// (`Smith,Jones, 2020 2021` leaves `Smith,2021`), so passes repeat until
/// none is left. Every match is non-empty, so each pass shrinks the text.
pub fn strip_citations(text: &str) -> String {
    let mut text = text.to_string();
    while CITATION.is_match(&text) {
        text = CITATION.replace_all(&text, "").into_owned();
    }
    text
}

/// Collapse `...` and `. . .` into a semicolon.
pub fn collapse_ellipses(text: &str) -> String {
    text.replace("...", ";").replace(". . .", ";")
}

/// Apply the rewrite table in a single left-to-right pass.
pub fn rewrite(text: &str) -> String {
    REWRITE_PATTERN
        .replace_all(text, |caps: &Captures| {
            let key = &caps[0];
            REWRITE_TABLE.get(key).copied().unwrap_or(key).to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_citation() {
        assert_eq!(
            strip_citations("Smith, 2020 argued the resuts are robust."),
            "argued the resuts are robust."
        );
    }

    #[test]
    fn test_strips_coauthor_and_page_forms() {
        assert_eq!(
            strip_citations("as shown (Smith & Jones, 2019, p. 12)."),
            "as shown ()."
        );
        assert_eq!(
            strip_citations("Brown and Green (2001, p. 4) showed it"),
            "showed it"
        );
        assert_eq!(strip_citations("Smith et al. (2018) found it"), "found it");
        assert_eq!(
            strip_citations("see Lee, Park, 1999 for details"),
            "see for details"
        );
    }

    #[test]
    fn test_leaves_plain_years_alone() {
        let text = "In 2020 the Smith 2020 report was filed.";
        assert_eq!(strip_citations(text), text);
    }

    #[test]
    fn test_citation_stripping_is_idempotent() {
        let inputs = [
            "Smith, 2020 argued the resuts are robust.",
            "Brown Smith, 2020, 2021 and more",
            "as shown (Smith & Jones, 2019, p. 12). Lee, 2001 Park, 2002 agree",
            "Doe et al. 2015 wrote (Roe, 1999)",
            "Nothing to see here.",
            "Smith,Jones, 2020 2021 argued",
        ];
        for input in inputs {
            let once = strip_citations(input);
            assert_eq!(strip_citations(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_strips_citation_exposed_by_earlier_removal() {
        assert_eq!(strip_citations("Smith,Jones, 2020 2021 argued"), "argued");
    }

    #[test]
    fn test_collapses_ellipses() {
        assert_eq!(collapse_ellipses("wait... what . . . now"), "wait; what ; now");
    }

    #[test]
    fn test_rewrite_table() {
        assert_eq!(rewrite("isn't it"), "is not it");
        assert_eq!(rewrite("we'll go"), "we will go");
        assert_eq!(rewrite("students' work"), "students ' work");
        assert_eq!(rewrite("well-known"), "well known");
        assert_eq!(rewrite("end."), "end . ");
        assert_eq!(rewrite("a\\b\nc"), "a b c");
        assert_eq!(rewrite("\u{201C}quoted\u{201D}"), " \" quoted \" ");
        assert_eq!(rewrite("(a*b)?!"), " ( a * b )  ?  ! ");
    }

    #[test]
    fn test_rewrite_is_single_pass() {
        // A sequential replacer would space the quote produced by the escaped-quote rule.
        assert_eq!(rewrite(r#"say \"hi\""#), r#"say "hi""#);
        assert_eq!(rewrite("can't."), "ca not . ");
    }

    #[test]
    fn test_original_skips_rewrite_table() {
        let working = normalize("Hello, world... Smith, 2020 said so.", true);
        assert_eq!(working.original, "Hello, world; said so.");
        assert_eq!(working.cleaned, "Hello ,  world; said so . ");
    }

    #[test]
    fn test_citations_kept_when_disabled() {
        let working = normalize("Smith, 2020 argued.", false);
        assert_eq!(working.original, "Smith, 2020 argued.");
    }
}
