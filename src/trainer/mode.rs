use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::SnippetLength;
use crate::session::stats::{RunTotals, TypingStats};

/// Countdown lengths offered for timed runs.
pub const TIME_LIMITS: [u32; 3] = [30, 45, 60];
pub const DEFAULT_TIME_LIMIT: u32 = 30;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unlimited adaptive practice.
    #[default]
    Training,
    /// Fixed-length run over short snippets with cumulative stats.
    Timed,
}

impl Mode {
    pub fn toggle(self) -> Self {
        match self {
            Mode::Training => Mode::Timed,
            Mode::Timed => Mode::Training,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Training => "training",
            Mode::Timed => "timed",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_valid_time_limit(secs: u32) -> bool {
    TIME_LIMITS.contains(&secs)
}

pub fn next_time_limit(secs: u32) -> u32 {
    TIME_LIMITS
        .iter()
        .position(|&t| t == secs)
        .map_or(DEFAULT_TIME_LIMIT, |i| TIME_LIMITS[(i + 1) % TIME_LIMITS.len()])
}

/// User choices restored across launches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub language: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: u32,
    #[serde(default = "default_snippet_length")]
    pub snippet_length: SnippetLength,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT
}

fn default_snippet_length() -> SnippetLength {
    SnippetLength::Short
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "javascript".to_string(),
            mode: Mode::Training,
            time_limit_secs: DEFAULT_TIME_LIMIT,
            snippet_length: default_snippet_length(),
        }
    }
}

impl Preferences {
    /// Replace an unknown language or unsupported time limit with usable
    /// values. Returns whether anything changed.
    pub fn normalize(&mut self, languages: &[&str]) -> bool {
        let mut changed = false;
        if !is_valid_time_limit(self.time_limit_secs) {
            self.time_limit_secs = DEFAULT_TIME_LIMIT;
            changed = true;
        }
        if !languages.contains(&self.language.as_str()) {
            let fallback = if languages.contains(&"javascript") {
                "javascript"
            } else {
                languages.first().copied().unwrap_or("javascript")
            };
            if self.language != fallback {
                self.language = fallback.to_string();
                changed = true;
            }
        }
        changed
    }
}

/// What the front end should be showing.
#[derive(Clone, Debug, PartialEq)]
pub enum RunPhase {
    Typing,
    /// A timed run ended; holds its final stats.
    Results(TypingStats),
}

/// Per-run bookkeeping, discarded whenever a new run starts.
#[derive(Clone, Debug, PartialEq)]
pub struct RunState {
    pub time_remaining: u32,
    pub timer_running: bool,
    pub totals: RunTotals,
    pub completed_count: u32,
    /// Set once the current snippet's completion has been processed; cleared
    /// when the next snippet loads.
    pub completion_latched: bool,
}

impl RunState {
    pub fn new(time_limit_secs: u32) -> Self {
        Self {
            time_remaining: time_limit_secs,
            timer_running: false,
            totals: RunTotals::default(),
            completed_count: 0,
            completion_latched: false,
        }
    }
}
