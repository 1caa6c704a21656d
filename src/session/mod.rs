pub mod input;
pub mod result;
pub mod stats;
pub mod typing;

pub use input::{Key, KeystrokeEvent};
pub use result::{SessionHistory, SessionRecord};
pub use stats::{RunTotals, TypingStats, calculate_accuracy, calculate_wpm};
pub use typing::{CharStatus, SessionPhase, TypingSession};
