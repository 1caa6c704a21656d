use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::catalog::SnippetLength;
use crate::engine::scoring::{
    DEFAULT_ERROR_WEIGHT, DEFAULT_NEEDS_TRAINING_THRESHOLD, DEFAULT_TIME_DIVISOR, ScoreWeights,
};
use crate::trainer::TrainerSettings;
use crate::trainer::mode::{DEFAULT_TIME_LIMIT, Mode, Preferences, is_valid_time_limit};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u32,
    #[serde(default = "default_snippet_length")]
    pub snippet_length: SnippetLength,
    #[serde(default = "default_transition_delay_ms")]
    pub transition_delay_ms: u64,
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    #[serde(default = "default_error_weight")]
    pub error_weight: f64,
    #[serde(default = "default_time_divisor")]
    pub time_divisor: f64,
    #[serde(default = "default_needs_training_threshold")]
    pub needs_training_threshold: f64,
    /// Overrides the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_language() -> String {
    "javascript".to_string()
}
fn default_time_limit_secs() -> u32 {
    DEFAULT_TIME_LIMIT
}
fn default_snippet_length() -> SnippetLength {
    SnippetLength::Short
}
fn default_transition_delay_ms() -> u64 {
    200
}
fn default_recent_window() -> usize {
    10
}
fn default_error_weight() -> f64 {
    DEFAULT_ERROR_WEIGHT
}
fn default_time_divisor() -> f64 {
    DEFAULT_TIME_DIVISOR
}
fn default_needs_training_threshold() -> f64 {
    DEFAULT_NEEDS_TRAINING_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            mode: Mode::default(),
            time_limit_secs: default_time_limit_secs(),
            snippet_length: default_snippet_length(),
            transition_delay_ms: default_transition_delay_ms(),
            recent_window: default_recent_window(),
            error_weight: default_error_weight(),
            time_divisor: default_time_divisor(),
            needs_training_threshold: default_needs_training_threshold(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snipdrill")
            .join("config.toml")
    }

    /// Reset an unknown language or unsupported time limit to the defaults.
    /// Call after deserialization to handle stale values in old configs.
    pub fn normalize(&mut self, valid_languages: &[&str]) {
        if !valid_languages.contains(&self.language.as_str()) {
            self.language = default_language();
        }
        if !is_valid_time_limit(self.time_limit_secs) {
            self.time_limit_secs = default_time_limit_secs();
        }
        if self.recent_window == 0 {
            self.recent_window = default_recent_window();
        }
    }

    pub fn score_weights(&self) -> ScoreWeights {
        ScoreWeights {
            error_weight: self.error_weight,
            time_divisor: self.time_divisor,
            needs_training_threshold: self.needs_training_threshold,
        }
    }

    pub fn trainer_settings(&self) -> TrainerSettings {
        TrainerSettings {
            weights: self.score_weights(),
            transition_delay: Duration::from_millis(self.transition_delay_ms),
            recent_window: self.recent_window,
        }
    }

    /// Starting preferences when none have been stored yet.
    pub fn preferences(&self) -> Preferences {
        Preferences {
            language: self.language.clone(),
            mode: self.mode,
            time_limit_secs: self.time_limit_secs,
            snippet_length: self.snippet_length,
        }
    }
}
