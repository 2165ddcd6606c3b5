//! Services a function can reach during a session: document metadata and
//! spell-check dictionaries.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use rhai::{Dynamic, Map};
use serde::{Deserialize, Serialize};

/// Metadata of the document being processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse metadata file '{}'", path.display()))
    }

    /// Script-facing view: a map with `title`, `authors`, `language` and the
    /// extra fields. Missing values are `()`.
    pub fn to_rhai_map(&self) -> Map {
        let mut map = Map::new();
        map.insert(
            "title".into(),
            self.title.clone().map(Dynamic::from).unwrap_or(Dynamic::UNIT),
        );
        let authors: rhai::Array = self.authors.iter().cloned().map(Dynamic::from).collect();
        map.insert("authors".into(), Dynamic::from(authors));
        map.insert(
            "language".into(),
            self.language.clone().map(Dynamic::from).unwrap_or(Dynamic::UNIT),
        );
        for (key, value) in &self.extra {
            map.insert(key.as_str().into(), json_to_dynamic(value));
        }
        map
    }
}

/// Convert serde_json::Value to rhai::Dynamic
fn json_to_dynamic(value: &serde_json::Value) -> Dynamic {
    match value {
        serde_json::Value::String(s) => Dynamic::from(s.clone()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::from(n.to_string())
            }
        }
        serde_json::Value::Bool(b) => Dynamic::from(*b),
        serde_json::Value::Null => Dynamic::UNIT,
        serde_json::Value::Array(items) => {
            let array: rhai::Array = items.iter().map(json_to_dynamic).collect();
            Dynamic::from(array)
        }
        serde_json::Value::Object(fields) => {
            let mut map = Map::new();
            for (key, value) in fields {
                map.insert(key.as_str().into(), json_to_dynamic(value));
            }
            Dynamic::from(map)
        }
    }
}

/// Spell-check lookups offered to functions.
pub trait Dictionaries: Send + Sync {
    fn recognized(&self, word: &str, locale: Option<&str>) -> bool;
    fn suggestions(&self, word: &str, locale: Option<&str>) -> Vec<String>;
}

/// Dictionary service that knows no words.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDictionaries;

impl Dictionaries for NoDictionaries {
    fn recognized(&self, _word: &str, _locale: Option<&str>) -> bool {
        false
    }

    fn suggestions(&self, _word: &str, _locale: Option<&str>) -> Vec<String> {
        Vec::new()
    }
}

const MAX_SUGGESTIONS: usize = 10;
const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Case-insensitive dictionary backed by a plain word list.
///
/// The locale argument is ignored; load one list per language.
#[derive(Debug, Default, Clone)]
pub struct WordListDictionary {
    words: BTreeSet<String>,
}

impl WordListDictionary {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// One word per line; blank lines and lines starting with `#` are skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary '{}'", path.display()))?;
        Ok(Self::from_words(
            text.lines().filter(|line| !line.trim_start().starts_with('#')),
        ))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Dictionaries for WordListDictionary {
    fn recognized(&self, word: &str, _locale: Option<&str>) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    fn suggestions(&self, word: &str, _locale: Option<&str>) -> Vec<String> {
        let needle = word.to_lowercase();
        let mut scored: Vec<(usize, &String)> = self
            .words
            .iter()
            .filter(|candidate| **candidate != needle)
            .map(|candidate| (edit_distance(&needle, candidate), candidate))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .collect();
        scored.sort();
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, candidate)| candidate.clone())
            .collect()
    }
}

fn edit_distance(lhs: &str, rhs: &str) -> usize {
    let lhs_chars: Vec<char> = lhs.chars().collect();
    let rhs_chars: Vec<char> = rhs.chars().collect();
    if lhs_chars.is_empty() {
        return rhs_chars.len();
    }
    if rhs_chars.is_empty() {
        return lhs_chars.len();
    }

    let mut prev: Vec<usize> = (0..=rhs_chars.len()).collect();
    let mut curr: Vec<usize> = vec![0; rhs_chars.len() + 1];

    for (i, &lhs_ch) in lhs_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &rhs_ch) in rhs_chars.iter().enumerate() {
            let cost = usize::from(lhs_ch != rhs_ch);
            let insertion = curr[j] + 1;
            let deletion = prev[j + 1] + 1;
            let substitution = prev[j] + cost;
            curr[j + 1] = insertion.min(deletion).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[rhs_chars.len()]
}

/// Handle the caller hands to a session for the current document.
pub trait HostServices {
    fn current_metadata(&self) -> DocumentMetadata;
    fn dictionaries(&self) -> Arc<dyn Dictionaries>;
}

/// Host with fixed metadata and dictionaries.
#[derive(Clone)]
pub struct StaticHost {
    metadata: DocumentMetadata,
    dictionaries: Arc<dyn Dictionaries>,
}

impl StaticHost {
    pub fn new(metadata: DocumentMetadata, dictionaries: Arc<dyn Dictionaries>) -> Self {
        Self {
            metadata,
            dictionaries,
        }
    }
}

impl Default for StaticHost {
    fn default() -> Self {
        Self::new(DocumentMetadata::default(), Arc::new(NoDictionaries))
    }
}

impl HostServices for StaticHost {
    fn current_metadata(&self) -> DocumentMetadata {
        self.metadata.clone()
    }

    fn dictionaries(&self) -> Arc<dyn Dictionaries> {
        Arc::clone(&self.dictionaries)
    }
}
