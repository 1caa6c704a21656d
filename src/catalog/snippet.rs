use std::fmt;

use icu_normalizer::ComposingNormalizerBorrowed;
use serde::{Deserialize, Serialize};

/// Number of spaces a Tab keystroke stands for. Snippets are normalized so
/// every indentation step is exactly this wide.
pub const TAB_WIDTH: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetLength {
    Short,
    Medium,
    Long,
}

impl SnippetLength {
    pub const ALL: [SnippetLength; 3] = [Self::Short, Self::Medium, Self::Long];

    pub fn as_str(self) -> &'static str {
        match self {
            SnippetLength::Short => "short",
            SnippetLength::Medium => "medium",
            SnippetLength::Long => "long",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SnippetLength::Short => SnippetLength::Medium,
            SnippetLength::Medium => SnippetLength::Long,
            SnippetLength::Long => SnippetLength::Short,
        }
    }
}

impl fmt::Display for SnippetLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A code snippet to be typed. Immutable once built: the character buffer the
/// session indexes into is derived from `code` at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Snippet {
    id: String,
    code: String,
    chars: Vec<char>,
    length: SnippetLength,
    difficulty: Difficulty,
    language: String,
    name: Option<String>,
    description: Option<String>,
}

impl Snippet {
    /// Build a snippet from code that is used exactly as given.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        length: SnippetLength,
        difficulty: Difficulty,
        language: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            id: id.into(),
            chars: code.chars().collect(),
            code,
            length,
            difficulty,
            language: language.into(),
            name: None,
            description: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Length in characters, the unit the cursor moves in.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn length(&self) -> SnippetLength {
        self.length
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn count_char(&self, ch: char) -> usize {
        self.chars.iter().filter(|&&c| c == ch).count()
    }
}

/// Canonicalize snippet source: unix line endings, tabs expanded to
/// [`TAB_WIDTH`] spaces, surrounding whitespace trimmed, NFC composed.
pub fn normalize_code(code: &str) -> String {
    let indent = " ".repeat(TAB_WIDTH);
    let unified = code
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', &indent);
    let trimmed = unified.trim();
    ComposingNormalizerBorrowed::new_nfc()
        .normalize(trimmed)
        .to_string()
}
