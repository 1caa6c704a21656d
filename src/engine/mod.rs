pub mod key_stats;
pub mod scoring;
pub mod selection;

pub use key_stats::{CharacterScore, KeystrokeTracker};
pub use scoring::ScoreWeights;
pub use selection::{RecentWindow, select_adaptive_snippet, select_random_snippet};
