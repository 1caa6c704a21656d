use serde::{Deserialize, Serialize};

use crate::engine::key_stats::CharacterScore;

/// Attempts a character needs before its score is trusted.
pub const MIN_ATTEMPTS: u32 = 3;
/// Inter-key gaps at or above this are pauses, not typing speed.
pub const MAX_VALID_TIMING_MS: f64 = 2000.0;
/// Total attempts that earn full practice credit in training progress.
pub const PRACTICE_TARGET_ATTEMPTS: u32 = 2000;
/// Below this many attempts training progress is halved.
pub const EARLY_DAMPING_ATTEMPTS: u32 = 50;
pub const DEFAULT_ERROR_WEIGHT: f64 = 200.0;
pub const DEFAULT_TIME_DIVISOR: f64 = 10.0;
pub const DEFAULT_NEEDS_TRAINING_THRESHOLD: f64 = 20.0;

/// Weights of the composite weakness score.
///
/// With the defaults a 100% error rate contributes 200 points, the same as an
/// average keystroke time of 2000ms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub error_weight: f64,
    pub time_divisor: f64,
    pub needs_training_threshold: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            error_weight: DEFAULT_ERROR_WEIGHT,
            time_divisor: DEFAULT_TIME_DIVISOR,
            needs_training_threshold: DEFAULT_NEEDS_TRAINING_THRESHOLD,
        }
    }
}

impl ScoreWeights {
    pub fn composite(&self, error_rate: f64, average_time_ms: f64) -> f64 {
        let divisor = if self.time_divisor > 0.0 {
            self.time_divisor
        } else {
            DEFAULT_TIME_DIVISOR
        };
        error_rate * self.error_weight + average_time_ms / divisor
    }
}

/// Progress tiers shown next to the training progress bar.
pub fn skill_level(progress: f64) -> &'static str {
    match progress {
        p if p <= 0.0 => "Tutorial Hell",
        p if p < 10.0 => "HTML is Programming",
        p if p < 20.0 => "Copilot Dependent",
        p if p < 30.0 => "Stack Overflow Copy-Pasta",
        p if p < 40.0 => "JavaScript Fatigue",
        p if p < 50.0 => "Works on My Machine",
        p if p < 60.0 => "Soy Dev",
        p if p < 70.0 => "CSS Centered",
        p if p < 75.0 => "Rejected by Google",
        p if p < 80.0 => "Arch BTW",
        p if p < 85.0 => "NixOS User",
        p if p < 90.0 => "Rust Evangelist",
        p if p < 95.0 => "10x Engineer",
        p if p < 99.0 => "ThePrimeagen",
        p if p < 100.0 => "Terry Davis",
        _ => "Linus Torvalds",
    }
}

/// Visible stand-ins for whitespace characters.
pub fn display_char(ch: char) -> String {
    match ch {
        ' ' => "\u{2423}".to_string(),  // ␣
        '\n' => "\u{21b5}".to_string(), // ↵
        '\t' => "\u{21e5}".to_string(), // ⇥
        other => other.to_string(),
    }
}

pub fn describe_weak_characters(scores: &[CharacterScore], limit: usize) -> Vec<String> {
    scores
        .iter()
        .take(limit)
        .map(|s| {
            format!(
                "{} ({:.0}% error, {:.0}ms)",
                display_char(s.ch),
                s.error_rate * 100.0,
                s.average_time_ms
            )
        })
        .collect()
}

/// `m:ss` for countdown display.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
