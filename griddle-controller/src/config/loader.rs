//! Configuration file loading

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use griddle_core::config::{CellConfig, ValidationError};
use thiserror::Error;
use tracing::{debug, info};

/// Embedded default configuration (compiled into the binary)
pub const EMBEDDED_CONFIG: &str = include_str!("../../cell.toml");

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    /// Config parsed but is inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// Load and validate the configuration
pub fn load(path: Option<&Path>) -> Result<CellConfig, ConfigError> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            parse(&text, &path.display().to_string())
        }
        None => {
            info!("Using embedded configuration");
            parse(EMBEDDED_CONFIG, "embedded cell.toml")
        }
    }
}

/// Parse and validate configuration text
pub fn parse(text: &str, origin: &str) -> Result<CellConfig, ConfigError> {
    let config: CellConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })?;
    config.validate()?;
    debug!("Configuration: {:?}", config);
    Ok(config)
}
