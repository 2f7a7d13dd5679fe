//! core::config
//!
//! Configuration defaults for rebase behavior.
//!
//! # Locations
//!
//! In order of precedence:
//! 1. `$RSQ_CONFIG` if set (absolute path to a TOML file)
//! 2. `<git_dir>/resequencer.toml` (repository scope)
//! 3. `<config_dir>/resequencer/config.toml` (user scope)
//!
//! CLI flags always override configuration values. Absent files simply
//! contribute nothing.
//!
//! # Example
//!
//! ```toml
//! autosquash = true
//! keep_empty = false
//! verbose = true
//! editor = "nano"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Rebase configuration defaults.
///
/// Every field is optional; unset fields fall back to the built-in default
/// when the CLI did not provide a flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rearrange `squash!`/`fixup!` commits by default.
    pub autosquash: Option<bool>,

    /// Keep commits whose tree equals their parent's tree.
    pub keep_empty: Option<bool>,

    /// Print a diffstat when the rebase finishes.
    pub verbose: Option<bool>,

    /// Editor command used for todo and message files.
    pub editor: Option<String>,
}

impl Config {
    /// Load configuration with the documented precedence.
    ///
    /// Later sources fill only the fields earlier sources left unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a file that exists cannot be read or
    /// parsed; missing files are not errors.
    pub fn load(git_dir: &Path) -> Result<Self, ConfigError> {
        let mut merged = Self::default();
        if let Ok(path) = std::env::var("RSQ_CONFIG") {
            merged.fill_from(Self::load_file(Path::new(&path))?);
        }
        merged.fill_from(Self::load_file(&git_dir.join("resequencer.toml"))?);
        if let Some(dir) = dirs::config_dir() {
            merged.fill_from(Self::load_file(&dir.join("resequencer/config.toml"))?);
        }
        Ok(merged)
    }

    /// Parse one file; `None`-equivalent default when it does not exist.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Take values from `other` for fields still unset here.
    fn fill_from(&mut self, other: Self) {
        self.autosquash = self.autosquash.or(other.autosquash);
        self.keep_empty = self.keep_empty.or(other.keep_empty);
        self.verbose = self.verbose.or(other.verbose);
        self.editor = self.editor.take().or(other.editor);
    }
}
