//! Selection of suspect (likely misspelled) words.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::dictionary::SpellDictionary;
use crate::names::{person_names, EntityTagger};

/// Punctuation tokens left behind by the rewrite table; never suspects.
pub const PUNCTUATION_TOKENS: [&str; 9] = ["!", ",", ".", "\"", "?", "(", ")", "*", "'"];

/// One flagged word occurrence and the dictionary's suggestions for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspectToken {
    pub surface_form: String,
    /// Best first; may be empty
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SuspectSelection {
    pub person_names: HashSet<String>,
    /// In word order, one entry per occurrence
    pub suspects: Vec<SuspectToken>,
}

/// Flag every whitespace-separated word the dictionary rejects, except
/// detected person names and punctuation tokens.
pub fn select_suspects(
    cleaned: &str,
    dictionary: &dyn SpellDictionary,
    tagger: &dyn EntityTagger,
) -> SuspectSelection {
    let person_names = person_names(tagger, cleaned);
    let mut suggestions: HashMap<&str, Vec<String>> = HashMap::new();
    let mut suspects = Vec::new();

    for word in cleaned.split_whitespace() {
        if PUNCTUATION_TOKENS.contains(&word)
            || person_names.contains(word)
            || dictionary.is_correct(word)
        {
            continue;
        }
        let ranked = suggestions
            .entry(word)
            .or_insert_with(|| dictionary.suggest(word))
            .clone();
        suspects.push(SuspectToken {
            surface_form: word.to_string(),
            suggestions: ranked,
        });
    }

    debug!(
        suspects = suspects.len(),
        distinct = suggestions.len(),
        names = person_names.len(),
        "Selected suspects"
    );
    SuspectSelection {
        person_names,
        suspects,
    }
}
