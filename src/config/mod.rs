//! Configuration loading and management.
//!
//! Split into a `types` module for the struct definitions and a
//! `defaults` module for the `#[serde(default = "...")]` functions.

mod defaults;
mod types;

use std::path::Path;

pub use types::{ClientConfig, ClientConfigFile};

use crate::error::ConfigError;

impl ClientConfigFile {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })
    }
}
