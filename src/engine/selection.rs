use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::Snippet;
use crate::engine::key_stats::CharacterScore;
use crate::engine::scoring::MIN_ATTEMPTS;

/// How many of the weakest characters drive snippet scoring.
pub const WEAK_CHAR_LIMIT: usize = 5;
/// Minimum size of the top-scoring candidate pool.
pub const MIN_POOL: usize = 3;
/// Fraction of matching snippets kept in the candidate pool.
pub const POOL_FRACTION: f64 = 0.2;

/// Weighted count of weak characters in a snippet.
pub fn snippet_score(snippet: &Snippet, weak: &[CharacterScore]) -> f64 {
    weak.iter()
        .map(|w| snippet.count_char(w.ch) as f64 * w.composite_score)
        .sum()
}

/// Pick the next snippet to practise, biased toward the user's weakest
/// characters. Entries under the attempt floor are ignored; the rest are
/// ranked by score here, so `weak` may come in any order.
pub fn select_adaptive_snippet<'a, R: Rng + ?Sized>(
    snippets: &'a [Snippet],
    weak: &[CharacterScore],
    recent: &[String],
    rng: &mut R,
) -> Option<&'a Snippet> {
    if snippets.is_empty() {
        return None;
    }
    let mut top_weak: Vec<CharacterScore> = weak
        .iter()
        .filter(|w| w.total_attempts >= MIN_ATTEMPTS)
        .cloned()
        .collect();
    if top_weak.is_empty() {
        return snippets.choose(rng);
    }
    top_weak.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top_weak.truncate(WEAK_CHAR_LIMIT);
    let mut scored: Vec<(&Snippet, f64)> = snippets
        .iter()
        .map(|s| (s, snippet_score(s, &top_weak)))
        .filter(|&(_, score)| score > 0.0)
        .collect();

    if scored.is_empty() {
        return snippets.choose(rng);
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let pool_size = MIN_POOL
        .max((scored.len() as f64 * POOL_FRACTION).ceil() as usize)
        .min(scored.len());
    let pool: Vec<&Snippet> = scored[..pool_size].iter().map(|&(s, _)| s).collect();

    let fresh: Vec<&Snippet> = pool
        .iter()
        .copied()
        .filter(|s| !is_recent(s, recent))
        .collect();
    let candidates = if fresh.is_empty() { pool } else { fresh };

    candidates.choose(rng).copied()
}

/// Uniform pick that avoids recently shown snippets when it can.
pub fn select_random_snippet<'a, R: Rng + ?Sized>(
    snippets: &'a [Snippet],
    recent: &[String],
    rng: &mut R,
) -> Option<&'a Snippet> {
    let fresh: Vec<&Snippet> = snippets.iter().filter(|s| !is_recent(s, recent)).collect();
    if fresh.is_empty() {
        snippets.choose(rng)
    } else {
        fresh.choose(rng).copied()
    }
}

fn is_recent(snippet: &Snippet, recent: &[String]) -> bool {
    recent.iter().any(|id| id == snippet.id())
}

/// Bounded most-recent-first list of shown snippet ids.
#[derive(Clone, Debug)]
pub struct RecentWindow {
    ids: Vec<String>,
    capacity: usize,
}

impl RecentWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
        self.ids.insert(0, id.to_string());
        self.ids.truncate(self.capacity);
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
