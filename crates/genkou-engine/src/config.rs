//! Engine configuration.
//!
//! All knobs have defaults matching the product's behavior: a few-second
//! load cooldown, a ~1.5 s save quiescence window, and a durable-cache
//! budget in the same ballpark as browser local storage. Config files are
//! TOML with every field optional.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default cooldown before a repeat load for the same document re-runs
/// the full source fan-out.
const DEFAULT_LOAD_COOLDOWN_MS: u64 = 3_000;

/// Default quiescence window before an edit triggers a debounced save.
const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1_500;

/// Default durable cache capacity (4 MiB).
const DEFAULT_DURABLE_CAPACITY_BYTES: u64 = 4 * 1024 * 1024;

/// Tunable engine behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Repeat loads for the same document within this window are
    /// coalesced instead of re-reading sources.
    pub load_cooldown_ms: u64,

    /// Edits schedule a save after this much quiet time; a newer edit
    /// resets the timer.
    pub save_debounce_ms: u64,

    /// Byte budget for persisted durable-cache entries. Writes that
    /// would exceed it fail (non-fatally).
    pub durable_capacity_bytes: u64,

    /// Directory for the filesystem-backed durable cache. `None` keeps
    /// the cache in memory (useful for tests and ephemeral sessions).
    pub durable_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            load_cooldown_ms: DEFAULT_LOAD_COOLDOWN_MS,
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            durable_capacity_bytes: DEFAULT_DURABLE_CAPACITY_BYTES,
            durable_dir: None,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML config string. Unknown keys are rejected so typos
    /// fail loudly instead of silently using defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load cooldown as a [`Duration`].
    pub fn load_cooldown(&self) -> Duration {
        Duration::from_millis(self.load_cooldown_ms)
    }

    /// Save debounce window as a [`Duration`].
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.load_cooldown(), Duration::from_secs(3));
        assert_eq!(cfg.save_debounce_ms, 1_500);
        assert!(cfg.durable_dir.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = EngineConfig::from_toml_str("save_debounce_ms = 200\n").expect("parse");
        assert_eq!(cfg.save_debounce_ms, 200);
        assert_eq!(cfg.load_cooldown_ms, DEFAULT_LOAD_COOLDOWN_MS);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(EngineConfig::from_toml_str("save_debonce_ms = 200\n").is_err());
    }

    #[test]
    fn test_durable_dir_parses() {
        let cfg = EngineConfig::from_toml_str("durable_dir = \"/tmp/cache\"\n").expect("parse");
        assert_eq!(cfg.durable_dir, Some(PathBuf::from("/tmp/cache")));
    }
}
