use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::engine::scoring::{
    EARLY_DAMPING_ATTEMPTS, MAX_VALID_TIMING_MS, MIN_ATTEMPTS, PRACTICE_TARGET_ATTEMPTS,
    ScoreWeights,
};

/// Aggregate performance for one expected character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterScore {
    #[serde(rename = "char")]
    pub ch: char,
    pub total_attempts: u32,
    pub error_count: u32,
    /// Attempts whose inter-key time counted toward the average.
    #[serde(default)]
    pub timed_attempts: u32,
    pub total_valid_time_ms: f64,
    pub average_time_ms: f64,
    pub error_rate: f64,
    pub composite_score: f64,
    /// What was typed instead, keyed by the actual character.
    #[serde(default)]
    pub mistakes: BTreeMap<char, u32>,
}

impl CharacterScore {
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            total_attempts: 0,
            error_count: 0,
            timed_attempts: 0,
            total_valid_time_ms: 0.0,
            average_time_ms: 0.0,
            error_rate: 0.0,
            composite_score: 0.0,
            mistakes: BTreeMap::new(),
        }
    }

    fn record(&mut self, actual: char, elapsed_ms: f64, weights: &ScoreWeights) {
        self.total_attempts += 1;
        if actual != self.ch {
            self.error_count += 1;
            *self.mistakes.entry(actual).or_insert(0) += 1;
        }
        if elapsed_ms > 0.0 && elapsed_ms < MAX_VALID_TIMING_MS {
            self.total_valid_time_ms += elapsed_ms;
            self.timed_attempts += 1;
        }
        self.rescore(weights);
    }

    fn rescore(&mut self, weights: &ScoreWeights) {
        self.average_time_ms = if self.timed_attempts > 0 {
            self.total_valid_time_ms / self.timed_attempts as f64
        } else {
            0.0
        };
        self.error_rate = if self.total_attempts > 0 {
            self.error_count as f64 / self.total_attempts as f64
        } else {
            0.0
        };
        self.composite_score = weights.composite(self.error_rate, self.average_time_ms);
    }

    /// Most frequent substitution for this character, if any.
    pub fn top_mistake(&self) -> Option<(char, u32)> {
        self.mistakes
            .iter()
            .max_by_key(|&(_, &n)| n)
            .map(|(&c, &n)| (c, n))
    }
}

/// Per-character timing and accuracy, keyed by the expected character.
#[derive(Clone, Debug, Default)]
pub struct KeystrokeTracker {
    scores: HashMap<char, CharacterScore>,
    weights: ScoreWeights,
    last_keystroke: Option<Instant>,
}

impl KeystrokeTracker {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            scores: HashMap::new(),
            weights,
            last_keystroke: None,
        }
    }

    /// Rebuild from persisted scores, recomputing derived fields under the
    /// current weights.
    pub fn from_scores(scores: HashMap<char, CharacterScore>, weights: ScoreWeights) -> Self {
        let mut tracker = Self::new(weights);
        tracker.scores = scores
            .into_iter()
            .map(|(ch, mut score)| {
                score.ch = ch;
                score.rescore(&weights);
                (ch, score)
            })
            .collect();
        tracker
    }

    pub fn scores(&self) -> &HashMap<char, CharacterScore> {
        &self.scores
    }

    pub fn get(&self, ch: char) -> Option<&CharacterScore> {
        self.scores.get(&ch)
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn record_keystroke(&mut self, expected: char, actual: char, now: Instant) {
        let elapsed_ms = match self.last_keystroke {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f64() * 1000.0,
            None => 0.0,
        };
        self.last_keystroke = Some(now);

        let weights = self.weights;
        self.scores
            .entry(expected)
            .or_insert_with(|| CharacterScore::new(expected))
            .record(actual, elapsed_ms, &weights);
    }

    /// Forget the previous keystroke so the next one is not charged with the
    /// gap before it.
    pub fn reset_timer(&mut self) {
        self.last_keystroke = None;
    }

    pub fn weakest_characters(&self, limit: usize) -> Vec<CharacterScore> {
        let mut ranked: Vec<CharacterScore> = self
            .scores
            .values()
            .filter(|s| s.total_attempts >= MIN_ATTEMPTS)
            .cloned()
            .collect();
        sort_by_score_desc(&mut ranked);
        ranked.truncate(limit);
        ranked
    }

    pub fn needs_training(&self) -> Vec<CharacterScore> {
        let threshold = self.weights.needs_training_threshold;
        let mut ranked: Vec<CharacterScore> = self
            .scores
            .values()
            .filter(|s| s.total_attempts >= MIN_ATTEMPTS && s.composite_score > threshold)
            .cloned()
            .collect();
        sort_by_score_desc(&mut ranked);
        ranked
    }

    /// 0-100 estimate that needs both low error rates and practice volume.
    pub fn training_progress(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let total_attempts: u32 = self.scores.values().map(|s| s.total_attempts).sum();
        let mean_error_rate =
            self.scores.values().map(|s| s.error_rate).sum::<f64>() / self.scores.len() as f64;

        let accuracy = (1.0 - mean_error_rate) * 100.0;
        let practice = ((total_attempts as f64 + 1.0).log10()
            / (PRACTICE_TARGET_ATTEMPTS as f64 + 1.0).log10())
        .clamp(0.0, 1.0);

        let mut progress = accuracy * practice;
        if total_attempts < EARLY_DAMPING_ATTEMPTS {
            progress *= 0.5;
        }
        progress.clamp(0.0, 100.0)
    }

    pub fn total_attempts(&self) -> u32 {
        self.scores.values().map(|s| s.total_attempts).sum()
    }

    pub fn clear(&mut self) {
        self.scores.clear();
        self.last_keystroke = None;
    }
}

fn sort_by_score_desc(scores: &mut [CharacterScore]) {
    scores.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.ch.cmp(&b.ch))
    });
}
