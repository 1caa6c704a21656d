use serde::{Deserialize, Serialize};

/// Words per minute at five characters per word. Zero when no time passed.
pub fn calculate_wpm(correct_chars: usize, elapsed_secs: f64) -> u32 {
    if elapsed_secs <= 0.0 {
        return 0;
    }
    let words = correct_chars as f64 / 5.0;
    (words / (elapsed_secs / 60.0)).round() as u32
}

/// Percentage of typed positions that were correct. An unstarted session is
/// 100% accurate.
pub fn calculate_accuracy(correct_chars: usize, total_typed: usize) -> u32 {
    if total_typed == 0 {
        return 100;
    }
    ((correct_chars as f64 / total_typed as f64) * 100.0).round() as u32
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub elapsed_secs: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_chars: usize,
}

impl TypingStats {
    pub fn compute(
        correct_chars: usize,
        incorrect_chars: usize,
        total_typed: usize,
        total_chars: usize,
        elapsed_secs: f64,
    ) -> Self {
        Self {
            wpm: calculate_wpm(correct_chars, elapsed_secs),
            accuracy: calculate_accuracy(correct_chars, total_typed),
            elapsed_secs,
            correct_chars,
            incorrect_chars,
            total_chars,
        }
    }
}

/// Running character totals across the snippets of one timed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub correct_chars: usize,
    pub incorrect_chars: usize,
}

impl RunTotals {
    pub fn add(&mut self, stats: &TypingStats) {
        self.correct_chars += stats.correct_chars;
        self.incorrect_chars += stats.incorrect_chars;
    }

    pub fn is_empty(&self) -> bool {
        self.correct_chars == 0 && self.incorrect_chars == 0
    }

    /// Stats over the whole run, timed against the configured limit rather
    /// than measured wall time. A run has no fixed text, so its total is
    /// what was typed.
    pub fn finalize(&self, time_limit_secs: u32) -> TypingStats {
        let typed = self.correct_chars + self.incorrect_chars;
        TypingStats::compute(
            self.correct_chars,
            self.incorrect_chars,
            typed,
            typed,
            time_limit_secs as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wpm_edges() {
        assert_eq!(calculate_wpm(0, 30.0), 0);
        assert_eq!(calculate_wpm(100, 0.0), 0);
        // 300 chars in 60 seconds
        assert_eq!(calculate_wpm(300, 60.0), 60);
        // 113 chars in 30 seconds = 45.2
        assert_eq!(calculate_wpm(113, 30.0), 45);
    }

    #[test]
    fn test_accuracy_edges() {
        assert_eq!(calculate_accuracy(0, 0), 100);
        assert_eq!(calculate_accuracy(50, 100), 50);
        assert_eq!(calculate_accuracy(2, 3), 67);
    }

    #[test]
    fn test_run_totals_finalize_uses_time_limit() {
        let mut totals = RunTotals::default();
        assert!(totals.is_empty());
        for (c, i) in [(40, 0), (38, 2), (20, 1), (15, 0)] {
            totals.add(&TypingStats::compute(c, i, c + i, c + i, 12.0));
        }
        let stats = totals.finalize(30);
        assert_eq!(stats.correct_chars, 113);
        assert_eq!(stats.incorrect_chars, 3);
        assert_eq!(stats.total_chars, 116);
        assert_eq!(stats.elapsed_secs, 30.0);
        assert_eq!(stats.wpm, calculate_wpm(113, 30.0));
        assert_eq!(stats.accuracy, 97);
    }

    #[test]
    fn test_run_totals_count_typed_not_snippet_length() {
        let mut totals = RunTotals::default();
        totals.add(&TypingStats::compute(40, 0, 40, 40, 10.0));
        // Stopped 21 keys into an 80 char snippet
        totals.add(&TypingStats::compute(20, 1, 21, 80, 5.0));
        let stats = totals.finalize(30);
        assert_eq!(stats.total_chars, 61);
        assert_eq!(stats.accuracy, calculate_accuracy(60, 61));
    }
}
