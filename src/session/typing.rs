use std::time::Instant;

use crate::catalog::Snippet;
use crate::session::input::{Key, KeystrokeEvent};
use crate::session::stats::TypingStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Active,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Correct,
    Incorrect(char),
}

/// Progress through one snippet.
///
/// The snippet is passed into every call instead of being stored, so the
/// session never holds stale code. `typed` always has one entry per advanced
/// position, so `typed.len() == cursor`.
#[derive(Clone, Debug, Default)]
pub struct TypingSession {
    typed: Vec<char>,
    cursor: usize,
    errors: usize,
    started_at: Option<Instant>,
    /// First keystroke on this snippet. Differs from `started_at` only after
    /// `reset_for_time_mode`.
    snippet_started_at: Option<Instant>,
    finished_at: Option<Instant>,
    final_stats: Option<TypingStats>,
}

impl TypingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.final_stats.is_some() {
            SessionPhase::Completed
        } else if self.started_at.is_some() {
            SessionPhase::Active
        } else {
            SessionPhase::Idle
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == SessionPhase::Completed
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn final_stats(&self) -> Option<&TypingStats> {
        self.final_stats.as_ref()
    }

    /// Stats of a completed snippet timed from its own first keystroke rather
    /// than the run start. Same as `final_stats` unless the start time was
    /// carried over.
    pub fn snippet_stats(&self) -> Option<TypingStats> {
        let stats = self.final_stats.as_ref()?;
        let elapsed = match (self.snippet_started_at, self.finished_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Default::default(),
        };
        Some(TypingStats::compute(
            stats.correct_chars,
            stats.incorrect_chars,
            self.cursor,
            stats.total_chars,
            elapsed.as_secs_f64(),
        ))
    }

    /// Correctness of an already typed position.
    pub fn char_status(&self, snippet: &Snippet, idx: usize) -> Option<CharStatus> {
        let typed = *self.typed.get(idx)?;
        let expected = *snippet.chars().get(idx)?;
        Some(if typed == expected {
            CharStatus::Correct
        } else {
            CharStatus::Incorrect(typed)
        })
    }

    /// Apply one key. Returns the attempt to forward to the character
    /// tracker, or `None` for keys that do not count as an attempt.
    pub fn handle_key(&mut self, snippet: &Snippet, key: &Key, now: Instant) -> Option<KeystrokeEvent> {
        if self.is_complete() || snippet.is_empty() || key.is_ignored() {
            return None;
        }
        let code = snippet.chars();
        let &expected = code.get(self.cursor)?;

        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if self.snippet_started_at.is_none() {
            self.snippet_started_at = Some(now);
        }

        let event = match key {
            Key::Backspace => {
                self.backspace(code);
                return None;
            }
            Key::Enter => {
                if expected == '\n' {
                    self.advance(&['\n']);
                } else {
                    self.errors += 1;
                }
                KeystrokeEvent::new(expected, '\n', now)
            }
            Key::Tab => {
                if code[self.cursor..].starts_with(&[' ', ' ']) {
                    self.advance(&[' ', ' ']);
                    KeystrokeEvent::new(expected, ' ', now)
                } else if expected == '\t' {
                    self.advance(&['\t']);
                    KeystrokeEvent::new(expected, '\t', now)
                } else {
                    self.errors += 1;
                    KeystrokeEvent::new(expected, '\t', now)
                }
            }
            Key::Char(c) => {
                if *c != expected {
                    self.errors += 1;
                }
                self.advance(&[*c]);
                KeystrokeEvent::new(expected, *c, now)
            }
            Key::Named(_) => return None,
        };

        if self.cursor >= code.len() {
            self.finished_at = Some(now);
            self.final_stats = Some(self.stats_at(code.len(), now));
        }
        Some(event)
    }

    fn advance(&mut self, typed: &[char]) {
        self.typed.extend_from_slice(typed);
        self.cursor += typed.len();
    }

    fn backspace(&mut self, code: &[char]) {
        if self.cursor == 0 {
            return;
        }
        let c = self.cursor;
        let undo_tab = c >= 2
            && self.typed[c - 2..c] == [' ', ' ']
            && code.get(c - 2..c) == Some(&[' ', ' '][..]);
        if undo_tab {
            self.typed.truncate(c - 2);
            self.cursor -= 2;
            return;
        }
        if let Some(removed) = self.typed.pop() {
            self.cursor -= 1;
            if code.get(self.cursor) != Some(&removed) {
                self.errors = self.errors.saturating_sub(1);
            }
        }
    }

    /// Clear all progress, including the start time.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clear progress for the next snippet of a timed run, keeping the start
    /// time so the countdown is unaffected.
    pub fn reset_for_time_mode(&mut self) {
        let started_at = self.started_at;
        *self = Self::default();
        self.started_at = started_at;
    }

    pub fn correct_chars(&self) -> usize {
        self.cursor.saturating_sub(self.errors)
    }

    /// Live stats against wall-clock time. `None` before the first keystroke.
    pub fn current_stats(&self, snippet: &Snippet, now: Instant) -> Option<TypingStats> {
        self.started_at?;
        Some(self.stats_at(snippet.len(), now))
    }

    fn stats_at(&self, total_chars: usize, now: Instant) -> TypingStats {
        let elapsed = match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => now.saturating_duration_since(start),
            _ => Default::default(),
        };
        TypingStats::compute(
            self.correct_chars(),
            self.errors,
            self.cursor,
            total_chars,
            elapsed.as_secs_f64(),
        )
    }
}
