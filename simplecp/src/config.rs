//! Runtime configuration
//!
//! A plain value built once at startup and handed to the [`Manager`](crate::Manager).
//! Every field has a default, so a TOML file only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::interface::{FolderNameMatching, SimpleCpError, SimpleCpResult};
use crate::models::DEFAULT_DISPLAY_LENGTH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted documents
    pub data_dir: PathBuf,
    pub history_file: String,
    pub snippets_file: String,
    /// History capacity
    pub max_history: usize,
    /// Items per display folder
    pub display_count: usize,
    /// Preview width for one-line display
    pub display_length: usize,
    pub check_interval_ms: u64,
    pub folder_names: FolderNameMatching,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            history_file: "history.json".to_string(),
            snippets_file: "snippets.json".to_string(),
            max_history: 50,
            display_count: 10,
            display_length: DEFAULT_DISPLAY_LENGTH,
            check_interval_ms: 1000,
            folder_names: FolderNameMatching::CaseSensitive,
        }
    }
}

impl Config {
    /// Read a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> SimpleCpResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SimpleCpError::Persistence {
                    operation: "read",
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let config: Config = toml::from_str(&contents)
            .map_err(|e| SimpleCpError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimpleCpResult<()> {
        if self.max_history == 0 {
            return Err(SimpleCpError::InvalidConfig(
                "max_history must be at least 1".to_string(),
            ));
        }
        if self.display_count == 0 || self.display_count > self.max_history {
            return Err(SimpleCpError::InvalidConfig(format!(
                "display_count must be between 1 and max_history ({}), got {}",
                self.max_history, self.display_count
            )));
        }
        if self.check_interval_ms == 0 {
            return Err(SimpleCpError::InvalidConfig(
                "check_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.history_file.trim().is_empty() || self.snippets_file.trim().is_empty() {
            return Err(SimpleCpError::InvalidConfig(
                "data file names cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    pub fn snippets_path(&self) -> PathBuf {
        self.data_dir.join(&self.snippets_file)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}
