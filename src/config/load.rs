use std::io;
use std::path::{Path, PathBuf};

use crate::config::schema::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Reads and parses `path`. A missing file is `Ok(None)`.
pub fn load_config(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

/// Like [`load_config`], falling back to defaults for a missing file.
pub fn load_config_or_default(path: &Path) -> Result<Config, ConfigError> {
    Ok(load_config(path)?.unwrap_or_default())
}
