use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::stats::TypingStats;
use crate::trainer::mode::Mode;

/// Most records kept in the persisted history.
pub const HISTORY_CAP: usize = 500;

/// One finished snippet, or one finished timed run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
    pub language: String,
    /// Absent for a timed-run summary spanning several snippets.
    #[serde(default)]
    pub snippet_id: Option<String>,
    #[serde(default)]
    pub snippets_completed: u32,
    pub stats: TypingStats,
}

impl SessionRecord {
    pub fn snippet(mode: Mode, language: &str, snippet_id: &str, stats: TypingStats) -> Self {
        Self {
            timestamp: Utc::now(),
            mode,
            language: language.to_string(),
            snippet_id: Some(snippet_id.to_string()),
            snippets_completed: 1,
            stats,
        }
    }

    pub fn timed_run(language: &str, snippets_completed: u32, stats: TypingStats) -> Self {
        Self {
            timestamp: Utc::now(),
            mode: Mode::Timed,
            language: language.to_string(),
            snippet_id: None,
            snippets_completed,
            stats,
        }
    }
}

/// Persisted session history, oldest first.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    pub records: Vec<SessionRecord>,
}

impl SessionHistory {
    pub fn push(&mut self, record: SessionRecord) {
        self.records.push(record);
        if self.records.len() > HISTORY_CAP {
            let excess = self.records.len() - HISTORY_CAP;
            self.records.drain(..excess);
        }
    }

    pub fn recent(&self, n: usize) -> &[SessionRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Mean WPM and accuracy over the last `n` records.
    pub fn recent_averages(&self, n: usize) -> Option<(f64, f64)> {
        let recent = self.recent(n);
        if recent.is_empty() {
            return None;
        }
        let count = recent.len() as f64;
        let wpm = recent.iter().map(|r| r.stats.wpm as f64).sum::<f64>() / count;
        let accuracy = recent.iter().map(|r| r.stats.accuracy as f64).sum::<f64>() / count;
        Some((wpm, accuracy))
    }

    pub fn best_wpm(&self) -> Option<u32> {
        self.records.iter().map(|r| r.stats.wpm).max()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
