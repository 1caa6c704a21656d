pub mod snippet;

use std::collections::{BTreeMap, HashSet};

use rust_embed::Embed;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub use snippet::{Difficulty, Snippet, SnippetLength, TAB_WIDTH, normalize_code};

#[derive(Embed)]
#[folder = "assets/snippets/"]
struct SnippetAssets;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("snippet file {file} is not valid JSON: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("snippet file {0} is not UTF-8")]
    Encoding(String),
    #[error("language {language} has duplicate snippet id {id}")]
    DuplicateId { language: String, id: String },
    #[error("snippet {id} in {language} has no code after normalization")]
    EmptySnippet { language: String, id: String },
    #[error("no snippet languages available")]
    Empty,
}

#[derive(Deserialize)]
struct LanguageFile {
    name: String,
    snippets: Vec<SnippetRecord>,
}

#[derive(Deserialize)]
struct SnippetRecord {
    id: String,
    code: String,
    length: SnippetLength,
    difficulty: Difficulty,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LanguageEntry {
    pub key: String,
    pub display_name: String,
    pub snippets: Vec<Snippet>,
}

/// Static snippet content keyed by language.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    languages: BTreeMap<String, LanguageEntry>,
}

impl Catalog {
    /// Load every language file embedded in the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();
        for file in SnippetAssets::iter() {
            let Some(key) = file.strip_suffix(".json") else {
                continue;
            };
            let Some(asset) = SnippetAssets::get(&file) else {
                continue;
            };
            let text = std::str::from_utf8(&asset.data)
                .map_err(|_| CatalogError::Encoding(file.to_string()))?;
            catalog.insert_json(key, text)?;
            debug!(language = key, snippets = catalog.snippets(key).len(), "loaded snippets");
        }
        if catalog.languages.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(catalog)
    }

    /// Parse a single language file's JSON into a catalog entry.
    pub fn insert_json(&mut self, key: &str, json: &str) -> Result<(), CatalogError> {
        let entry = parse_language(key, json)?;
        self.languages.insert(key.to_string(), entry);
        Ok(())
    }

    /// Register already-built snippets under a language key.
    pub fn insert_snippets(&mut self, key: &str, display_name: &str, snippets: Vec<Snippet>) {
        self.languages.insert(
            key.to_string(),
            LanguageEntry {
                key: key.to_string(),
                display_name: display_name.to_string(),
                snippets,
            },
        );
    }

    pub fn language_keys(&self) -> Vec<&str> {
        self.languages.keys().map(String::as_str).collect()
    }

    pub fn language(&self, key: &str) -> Option<&LanguageEntry> {
        self.languages.get(key)
    }

    pub fn snippets(&self, key: &str) -> &[Snippet] {
        self.languages
            .get(key)
            .map(|l| l.snippets.as_slice())
            .unwrap_or(&[])
    }

    /// Snippets of the requested length; the whole language if none match.
    pub fn snippets_of_length(&self, key: &str, length: SnippetLength) -> Vec<Snippet> {
        let all = self.snippets(key);
        let filtered: Vec<Snippet> = all.iter().filter(|s| s.length() == length).cloned().collect();
        if filtered.is_empty() {
            all.to_vec()
        } else {
            filtered
        }
    }

    pub fn next_language(&self, current: &str) -> Option<&str> {
        let keys = self.language_keys();
        if keys.is_empty() {
            return None;
        }
        let idx = keys.iter().position(|&k| k == current).map_or(0, |i| (i + 1) % keys.len());
        Some(keys[idx])
    }
}

fn parse_language(key: &str, json: &str) -> Result<LanguageEntry, CatalogError> {
    let file: LanguageFile = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
        file: format!("{key}.json"),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut snippets = Vec::with_capacity(file.snippets.len());
    for record in file.snippets {
        if !seen.insert(record.id.clone()) {
            return Err(CatalogError::DuplicateId {
                language: key.to_string(),
                id: record.id,
            });
        }
        let code = normalize_code(&record.code);
        if code.is_empty() {
            return Err(CatalogError::EmptySnippet {
                language: key.to_string(),
                id: record.id,
            });
        }
        snippets.push(
            Snippet::new(record.id, code, record.length, record.difficulty, key)
                .with_name(record.name)
                .with_description(record.description),
        );
    }

    Ok(LanguageEntry {
        key: key.to_string(),
        display_name: file.name,
        snippets,
    })
}
