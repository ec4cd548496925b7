//! Configuration for the reference-interpreter oracle, loaded from TOML.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration path relative to the user's config directory.
const CONFIG_FILE: &str = "naslvalue/oracle.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// How to reach the reference interpreter and its key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Reference interpreter executable.
    pub nasl_binary: PathBuf,
    /// Arguments passed before `-c <config> <script>`.
    pub nasl_args: Vec<String>,
    /// Key-value store executable started per run.
    pub redis_binary: PathBuf,
    /// How long to wait for the store's socket to appear.
    pub startup_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            nasl_binary: PathBuf::from("openvas-nasl"),
            nasl_args: vec!["-X".to_string()],
            redis_binary: PathBuf::from("redis-server"),
            startup_timeout_ms: 2000,
            poll_interval_ms: 1,
        }
    }
}

impl OracleConfig {
    /// Loads `explicit` if given, else the per-user file when it exists,
    /// else defaults. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.exists()),
        };
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(binary) = env::var_os("NASLVALUE_NASL_BIN") {
            self.nasl_binary = PathBuf::from(binary);
        }
        if let Some(binary) = env::var_os("NASLVALUE_REDIS_BIN") {
            self.redis_binary = PathBuf::from(binary);
        }
    }
}
