//! Multi-language dictionary lookup and suggestions.
//!
//! Loads Hunspell dictionaries (via zspell) or plain word lists for each
//! configured language. A word is correct when ANY loaded dictionary accepts
//! it. Suggestions are generated by edit-distance search over the affix
//! file's `TRY` alphabet and ranked by similarity to the misspelling.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use zspell::Dictionary;

use crate::error::{CorrectionError, CorrectionResult};
use crate::similarity::sequence_ratio;

/// Hunspell's English `TRY` line, used when no affix file declares one.
const DEFAULT_TRY: &str = "esianrtolcdugmphbyfvkwzESIANRTOLCDUGMPHBYFVKWZ'";

/// Words this short also get two-edit suggestions when one edit finds nothing.
const TWO_EDIT_MAX_CHARS: usize = 6;

/// Membership test and ranked suggestions for one or more languages.
pub trait SpellDictionary: Send + Sync {
    fn is_correct(&self, word: &str) -> bool;

    /// Suggestions for a misspelled word, best first. May be empty.
    fn suggest(&self, word: &str) -> Vec<String>;
}

/// Multi-language dictionary container
pub struct MultiLangDict {
    hunspell: Vec<(String, Dictionary)>,
    // Languages whose Hunspell files are missing or unusable with zspell
    word_lists: Vec<(String, HashSet<String>)>,
    alphabet: Vec<char>,
    max_suggestions: usize,
}

impl Default for MultiLangDict {
    fn default() -> Self {
        Self {
            hunspell: Vec::new(),
            word_lists: Vec::new(),
            alphabet: DEFAULT_TRY.chars().collect(),
            max_suggestions: 10,
        }
    }
}

impl MultiLangDict {
    /// Load every language from the given directory.
    ///
    /// Each language is read from `<lang>.aff` + `<lang>.dic`, falling back to
    /// `<lang>_words.txt`. Languages that fail to load are skipped with a
    /// warning; it is an error only if nothing loads.
    pub fn load(dict_dir: &Path, languages: &[String]) -> CorrectionResult<Self> {
        if !dict_dir.exists() {
            return Err(CorrectionError::Dictionary {
                message: format!("Dictionary directory not found: {}", dict_dir.display()),
            });
        }

        let mut dict = Self::default();
        let mut alphabet: Vec<char> = Vec::new();
        for name in languages {
            let aff_path = dict_dir.join(format!("{}.aff", name));
            let dic_path = dict_dir.join(format!("{}.dic", name));
            if aff_path.exists() && dic_path.exists() {
                match load_hunspell(&aff_path, &dic_path, name) {
                    Ok((d, try_chars)) => {
                        info!(language = %name, "Loaded dictionary");
                        merge_alphabet(&mut alphabet, try_chars);
                        dict.hunspell.push((name.clone(), d));
                        continue;
                    }
                    Err(e) => warn!(language = %name, error = %e, "Hunspell dictionary unusable"),
                }
            }

            let list_path = dict_dir.join(format!("{}_words.txt", name));
            if list_path.exists() {
                match load_word_list(&list_path) {
                    Ok(words) => {
                        info!(language = %name, words = words.len(), "Loaded word list");
                        dict.word_lists.push((name.clone(), words));
                    }
                    Err(e) => warn!(language = %name, error = %e, "Failed to read word list"),
                }
            } else {
                warn!(language = %name, "Dictionary not found");
            }
        }

        if dict.is_empty() {
            return Err(CorrectionError::Dictionary {
                message: format!("No dictionaries loaded from {}", dict_dir.display()),
            });
        }
        if !alphabet.is_empty() {
            dict.alphabet = alphabet;
        }
        info!("Dictionary initialization complete: {}", dict.stats());
        Ok(dict)
    }

    /// Build a dictionary from in-memory Hunspell affix and dic contents.
    pub fn from_hunspell_str(name: &str, aff: &str, dic: &str) -> CorrectionResult<Self> {
        let d = build_hunspell(name, aff, dic)?;
        let mut dict = Self::default();
        if let Some(try_chars) = parse_try(aff) {
            dict.alphabet = try_chars;
        }
        dict.hunspell.push((name.to_string(), d));
        Ok(dict)
    }

    /// Add a plain word list as another accepted language.
    pub fn with_word_list<I, S>(mut self, name: &str, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words.into_iter().map(Into::into).collect();
        self.word_lists.push((name.to_string(), words));
        self
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hunspell.is_empty() && self.word_lists.is_empty()
    }

    /// Check if a word exists in ANY loaded dictionary
    pub fn check(&self, word: &str) -> bool {
        // Try exact match first
        if self.check_exact(word) {
            return true;
        }
        // Try lowercase
        let lower = word.to_lowercase();
        lower != word && self.check_exact(&lower)
    }

    fn check_exact(&self, word: &str) -> bool {
        self.hunspell.iter().any(|(_, d)| d.check_word(word))
            || self.word_lists.iter().any(|(_, w)| w.contains(word))
    }

    /// Check which language(s) a word belongs to (for debugging)
    pub fn check_languages(&self, word: &str) -> Vec<&str> {
        let lower = word.to_lowercase();
        let hunspell = self
            .hunspell
            .iter()
            .filter(|(_, d)| d.check_word(word) || d.check_word(&lower))
            .map(|(name, _)| name.as_str());
        let lists = self
            .word_lists
            .iter()
            .filter(|(_, w)| w.contains(word) || w.contains(&lower))
            .map(|(name, _)| name.as_str());
        hunspell.chain(lists).collect()
    }

    /// Get stats about loaded dictionaries
    pub fn stats(&self) -> String {
        let hunspell: Vec<&str> = self.hunspell.iter().map(|(n, _)| n.as_str()).collect();
        let lists: Vec<String> = self
            .word_lists
            .iter()
            .map(|(n, w)| format!("{}({})", n, w.len()))
            .collect();
        format!(
            "hunspell=[{}], word_lists=[{}]",
            hunspell.join(", "),
            lists.join(", ")
        )
    }
}

impl SpellDictionary for MultiLangDict {
    fn is_correct(&self, word: &str) -> bool {
        self.check(word)
    }

    fn suggest(&self, word: &str) -> Vec<String> {
        suggest_with(word, &self.alphabet, self.max_suggestions, |candidate| {
            if follows_casing(word, candidate) {
                self.check(candidate)
            } else {
                // Other casings only for entries stored that way, e.g. proper nouns
                self.check_exact(candidate) && !self.check_exact(&candidate.to_lowercase())
            }
        })
    }
}

/// Whether `candidate` is cased the way `word` is: lowercase, Capitalized
/// when `word` starts uppercase, or UPPERCASE when `word` is.
fn follows_casing(word: &str, candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    if candidate == lower {
        return true;
    }
    if is_uppercase_word(word) && candidate == candidate.to_uppercase() {
        return true;
    }
    word.chars().next().is_some_and(char::is_uppercase) && candidate == capitalize(&lower)
}

fn is_uppercase_word(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && word == word.to_uppercase()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Ranked suggestions for `word` among the strings `is_word` accepts.
pub(crate) fn suggest_with<F>(word: &str, alphabet: &[char], limit: usize, is_word: F) -> Vec<String>
where
    F: Fn(&str) -> bool + Sync,
{
    if limit == 0 || word.is_empty() {
        return Vec::new();
    }

    let mut found: Vec<String> = single_edits(word, alphabet)
        .into_par_iter()
        .filter(|candidate| is_word(candidate))
        .collect();
    found.extend(split_pairs(word, &is_word));

    if found.is_empty() && word.chars().count() <= TWO_EDIT_MAX_CHARS {
        found = single_edits(word, alphabet)
            .par_iter()
            .flat_map_iter(|edit| single_edits(edit, alphabet))
            .filter(|candidate| is_word(candidate))
            .collect();
    }

    // Case variants of one word count once
    let lower = word.to_lowercase();
    let mut seen = HashSet::new();
    let mut scored: Vec<(String, f64)> = found
        .into_iter()
        .filter_map(|candidate| {
            let folded = candidate.to_lowercase();
            (candidate != word && seen.insert(folded.clone())).then(|| {
                let score = sequence_ratio(&lower, &folded);
                (candidate, score)
            })
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    debug!(word, suggestions = scored.len(), "Generated suggestions");
    scored.into_iter().map(|(candidate, _)| candidate).collect()
}

/// Deletes, transposes, replacements and inserts at edit distance one.
fn single_edits(word: &str, alphabet: &[char]) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    let build = |parts: &[&[char]]| -> String { parts.iter().flat_map(|p| p.iter()).collect() };
    let mut out = Vec::with_capacity(n * (2 * alphabet.len() + 2) + alphabet.len());

    for i in 0..n {
        out.push(build(&[&chars[..i], &chars[i + 1..]]));
    }
    for i in 0..n.saturating_sub(1) {
        let mut swapped = chars.clone();
        swapped.swap(i, i + 1);
        out.push(swapped.into_iter().collect());
    }
    for i in 0..n {
        for &c in alphabet {
            if c != chars[i] {
                out.push(build(&[&chars[..i], std::slice::from_ref(&c), &chars[i + 1..]]));
            }
        }
    }
    for i in 0..=n {
        for &c in alphabet {
            out.push(build(&[&chars[..i], std::slice::from_ref(&c), &chars[i..]]));
        }
    }
    out
}

/// Two-word splits where both halves are words, e.g. `arerobust` -> `are robust`.
fn split_pairs<F>(word: &str, is_word: &F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    word.char_indices()
        .skip(1)
        .map(|(i, _)| (&word[..i], &word[i..]))
        .filter(|(left, right)| is_word(left) && is_word(right))
        .map(|(left, right)| format!("{} {}", left, right))
        .collect()
}

fn parse_try(aff: &str) -> Option<Vec<char>> {
    aff.lines()
        .find_map(|line| line.trim().strip_prefix("TRY "))
        .map(|chars| chars.trim().chars().collect())
}

fn merge_alphabet(alphabet: &mut Vec<char>, extra: Option<Vec<char>>) {
    for c in extra.unwrap_or_default() {
        if !alphabet.contains(&c) {
            alphabet.push(c);
        }
    }
}

/// Load a simple word list, one word per line, `#` comments allowed
fn load_word_list(path: &Path) -> CorrectionResult<HashSet<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect())
}

fn load_hunspell(
    aff_path: &Path,
    dic_path: &Path,
    name: &str,
) -> CorrectionResult<(Dictionary, Option<Vec<char>>)> {
    let aff_content = fs::read_to_string(aff_path)?;
    let dic_content = fs::read_to_string(dic_path)?;
    let dict = build_hunspell(name, &aff_content, &dic_content)?;
    Ok((dict, parse_try(&aff_content)))
}

/// Build a single Hunspell dictionary using zspell builder pattern
fn build_hunspell(name: &str, aff: &str, dic: &str) -> CorrectionResult<Dictionary> {
    zspell::builder()
        .config_str(aff)
        .dict_str(dic)
        .build()
        .map_err(|e| CorrectionError::Dictionary {
            message: format!("Failed to build dictionary {}: {}", name, e),
        })
}
