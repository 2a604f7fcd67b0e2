//! Configuration from environment variables with per-user defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{RecordError, Result};

/// Overrides the media root directory
pub const MEDIA_ROOT_VAR: &str = "RECORD_SIGNALS_MEDIA_ROOT";
/// Overrides the catalog database file
pub const DATABASE_VAR: &str = "RECORD_SIGNALS_DB";

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "record_signals=info,warn";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub media_root: PathBuf,
    pub database_path: PathBuf,
}

impl Config {
    /// Read the environment, falling back to the user's data directory:
    /// - Linux: ~/.local/share/record-signals/
    /// - macOS: ~/Library/Application Support/record-signals/
    /// - Windows: %APPDATA%\record-signals\
    pub fn from_env() -> Result<Self> {
        Self::resolve(
            env::var_os(MEDIA_ROOT_VAR).map(PathBuf::from),
            env::var_os(DATABASE_VAR).map(PathBuf::from),
        )
    }

    /// Build a config from explicit values, filling the gaps with defaults
    pub fn resolve(media_root: Option<PathBuf>, database_path: Option<PathBuf>) -> Result<Self> {
        let media_root = match media_root {
            Some(path) => path,
            None => Self::data_dir()?.join("media"),
        };
        let database_path = match database_path {
            Some(path) => path,
            None => Self::data_dir()?.join("catalog.db"),
        };

        Ok(Config {
            media_root,
            database_path,
        })
    }

    /// Like [`Config::from_env`], but explicit values (command line flags)
    /// take precedence over the environment
    pub fn from_env_or(media_root: Option<PathBuf>, database_path: Option<PathBuf>) -> Result<Self> {
        Self::resolve(
            media_root.or_else(|| env::var_os(MEDIA_ROOT_VAR).map(PathBuf::from)),
            database_path.or_else(|| env::var_os(DATABASE_VAR).map(PathBuf::from)),
        )
    }

    fn data_dir() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                RecordError::Config(format!(
                    "could not determine a data directory, set {} and {}",
                    MEDIA_ROOT_VAR, DATABASE_VAR
                ))
            })?;
        path.push("record-signals");
        Ok(path)
    }
}
