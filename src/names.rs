//! Person-name detection.
//!
//! Names found here are never treated as misspellings. Any sentence splitter
//! plus chunking tagger can be plugged in through [`EntityTagger`];
//! [`GazetteerTagger`] is the built-in one, driven by a list of known names.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CorrectionResult;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+\s+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLabel {
    Person,
    Organization,
    Location,
    Other(String),
}

/// IOB chunk position of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkTag {
    Outside,
    Begin(EntityLabel),
    Inside(EntityLabel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub chunk: ChunkTag,
}

impl TaggedToken {
    pub fn new(text: impl Into<String>, chunk: ChunkTag) -> Self {
        Self {
            text: text.into(),
            chunk,
        }
    }
}

/// Sentence splitting plus named-entity chunking.
pub trait EntityTagger: Send + Sync {
    fn sentences(&self, text: &str) -> Vec<String>;

    fn tag(&self, sentence: &str) -> Vec<TaggedToken>;
}

/// First token of every PERSON chunk in the text, deduplicated.
pub fn person_names(tagger: &dyn EntityTagger, text: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    for sentence in tagger.sentences(text) {
        let mut in_person = false;
        for token in tagger.tag(&sentence) {
            match token.chunk {
                ChunkTag::Begin(EntityLabel::Person) => {
                    names.insert(token.text);
                    in_person = true;
                }
                // Tolerate chunks that open without a Begin tag
                ChunkTag::Inside(EntityLabel::Person) => {
                    if !in_person {
                        names.insert(token.text);
                        in_person = true;
                    }
                }
                _ => in_person = false,
            }
        }
    }
    names
}

/// Tags runs of listed names as PERSON chunks.
#[derive(Debug, Clone, Default)]
pub struct GazetteerTagger {
    names: HashSet<String>,
}

impl GazetteerTagger {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Load names from a file (one name per line, `#` comments allowed)
    pub fn load_from_file(path: &Path) -> CorrectionResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        ))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl EntityTagger for GazetteerTagger {
    fn sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in SENTENCE_END.find_iter(text) {
            let sentence = text[start..m.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = m.end();
        }
        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }
        sentences
    }

    fn tag(&self, sentence: &str) -> Vec<TaggedToken> {
        let mut previous_was_name = false;
        sentence
            .split_whitespace()
            .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|word| !word.is_empty())
            .map(|word| {
                let chunk = match (self.names.contains(word), previous_was_name) {
                    (true, false) => ChunkTag::Begin(EntityLabel::Person),
                    (true, true) => ChunkTag::Inside(EntityLabel::Person),
                    (false, _) => ChunkTag::Outside,
                };
                previous_was_name = chunk != ChunkTag::Outside;
                TaggedToken::new(word, chunk)
            })
            .collect()
    }
}
