//! Daemon configuration.
//!
//! A small TOML file; every field has a default so a missing file (at the
//! default location) means a default daemon. An explicitly requested
//! config path that cannot be read is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use courier_proto::PushKey;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Unix-seconds cutover below which MMS guids lose their prefix on
    /// backfill reads. 0 disables the rewrite.
    pub use_old_mms_guids_until: i64,
    pub supports_contacts: bool,
    pub supports_groups: bool,
    /// Stands in for the platform permission service.
    pub permissions_granted: bool,
    /// Creator tag written on locally sent rows and compared on reads to
    /// flag bridge-originated messages.
    pub creator_tag: String,
    pub push_key: Option<PushKey>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_old_mms_guids_until: 0,
            supports_contacts: true,
            supports_groups: true,
            permissions_granted: true,
            creator_tag: "courier".to_string(),
            push_key: None,
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location when
    /// none is given. A missing file is only tolerated at the default
    /// location.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] when an explicitly named file cannot be read,
    /// [`ConfigError::Toml`] when the contents do not parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path(), false),
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(source) if !required && source.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        toml::from_str(&text).map_err(|source| ConfigError::Toml { path, source })
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("courier")
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("courier")
        .join("config.toml")
}

/// Default location of the telephony store database.
pub fn default_db_path() -> PathBuf {
    data_dir().join("telephony.db")
}

/// Default directory for materialized MMS attachment bodies.
pub fn default_cache_dir() -> PathBuf {
    data_dir().join("cache")
}
