use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::key_stats::CharacterScore;

pub const SCHEMA_VERSION: u32 = 1;

pub const KEYSTROKE_TRACKING: &str = "keystroke_tracking";
pub const PREFERENCES: &str = "preferences";
pub const SESSION_HISTORY: &str = "session_history";

/// Envelope around every persisted payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub schema_version: u32,
    pub data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            data,
        }
    }

    /// Check if loaded data has a stale schema version and should be dropped.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

/// Character scores as persisted under [`KEYSTROKE_TRACKING`].
pub type TrackingData = HashMap<char, CharacterScore>;
