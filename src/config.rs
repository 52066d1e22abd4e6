// File: src/config.rs
use crate::error::{ImeError, Result};
use crate::persistence::{load_json, save_json};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const APP_DIR_NAME: &str = "code-table-ime";
pub const DICTIONARY_FILENAME: &str = "word.tab";
pub const HISTORY_FILENAME: &str = "history.json";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const DEFAULT_MAX_CODE_LEN: usize = 6;

/// Directory holding settings, dictionary and history. Falls back to the
/// working directory when the platform has no config dir.
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn get_settings_path() -> PathBuf {
    get_config_dir().join(SETTINGS_FILENAME)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dictionary_path: PathBuf,
    pub history_path: PathBuf,
    /// Enables the V/R shortcode fallback.
    pub vr_mode: bool,
    /// Appends the first candidate as soon as a selection opens.
    pub preselect_mode: bool,
    /// Typed codes are cut to this many characters.
    pub max_code_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::in_dir(&get_config_dir())
    }
}

impl EngineConfig {
    /// Default settings with every file placed in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dictionary_path: dir.join(DICTIONARY_FILENAME),
            history_path: dir.join(HISTORY_FILENAME),
            vr_mode: false,
            preselect_mode: false,
            max_code_len: DEFAULT_MAX_CODE_LEN,
        }
    }

    /// Reads settings from `path`. Keys missing from the file take their
    /// default values.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = load_json(path)
            .map_err(|e| ImeError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing, unreadable or invalid file
    /// yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "using default settings");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path).map_err(|e: io::Error| {
            ImeError::Config(format!("cannot write {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_code_len == 0 {
            return Err(ImeError::Config("max_code_len must be at least 1".into()));
        }
        if self.dictionary_path.as_os_str().is_empty() {
            return Err(ImeError::Config("dictionary_path is empty".into()));
        }
        Ok(())
    }
}
