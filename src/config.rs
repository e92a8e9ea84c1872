use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TypeRushError};
use crate::text::{DEFAULT_LOOKAHEAD_THRESHOLD, DEFAULT_MINIMUM_INITIAL_LENGTH, DEFAULT_PROFILE_ID};

/// Durations offered by the front end
pub const COMMON_DURATIONS: [u32; 4] = [15, 30, 60, 120];

/// Settings a session is created from
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub total_duration_secs: u32,
    pub difficulty: String,
    pub lookahead_threshold: usize,
    pub minimum_initial_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            total_duration_secs: 60,
            difficulty: DEFAULT_PROFILE_ID.to_string(),
            lookahead_threshold: DEFAULT_LOOKAHEAD_THRESHOLD,
            minimum_initial_length: DEFAULT_MINIMUM_INITIAL_LENGTH,
        }
    }
}

impl EngineConfig {
    pub fn new(total_duration_secs: u32, difficulty: impl Into<String>) -> Self {
        Self {
            total_duration_secs,
            difficulty: difficulty.into(),
            ..Self::default()
        }
    }

    /// Reject settings no session can run with. Unknown difficulty ids are
    /// not an error here; they fall back when the profile is resolved.
    pub fn validate(&self) -> Result<()> {
        if self.total_duration_secs == 0 {
            return Err(TypeRushError::InvalidDuration {
                seconds: self.total_duration_secs,
            });
        }
        if self.lookahead_threshold == 0 {
            return Err(TypeRushError::InvalidLookahead);
        }
        Ok(())
    }
}

/// Persisted user settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub total_duration_secs: u32,
    pub difficulty: String,
    pub lookahead_threshold: usize,
    pub minimum_initial_length: usize,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            total_duration_secs: engine.total_duration_secs,
            difficulty: engine.difficulty,
            lookahead_threshold: engine.lookahead_threshold,
            minimum_initial_length: engine.minimum_initial_length,
            seed: None,
        }
    }
}

impl From<&Config> for EngineConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            total_duration_secs: cfg.total_duration_secs,
            difficulty: cfg.difficulty.clone(),
            lookahead_threshold: cfg.lookahead_threshold,
            minimum_initial_length: cfg.minimum_initial_length,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typerush") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typerush_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "ignoring malformed config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn default_engine_config_is_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.lookahead_threshold, 50);
        assert_eq!(cfg.minimum_initial_length, 100);
        assert_eq!(cfg.difficulty, "medium");
    }

    #[test]
    fn zero_duration_is_rejected() {
        let cfg = EngineConfig::new(0, "easy");
        assert_matches!(
            cfg.validate(),
            Err(TypeRushError::InvalidDuration { seconds: 0 })
        );
    }

    #[test]
    fn zero_lookahead_is_rejected() {
        let cfg = EngineConfig {
            lookahead_threshold: 0,
            ..EngineConfig::default()
        };
        assert_matches!(cfg.validate(), Err(TypeRushError::InvalidLookahead));
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            total_duration_secs: 15,
            difficulty: "hard".into(),
            lookahead_threshold: 80,
            minimum_initial_length: 200,
            seed: Some(7),
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
        assert_eq!(EngineConfig::from(&cfg).total_duration_secs, 15);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "difficulty": "easy" }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.difficulty, "easy");
        assert_eq!(cfg.total_duration_secs, 60);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn malformed_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }
}
