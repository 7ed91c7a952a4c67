//! Merge session configuration, stored as TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::alleles::DEFAULT_INIT_NUM_ALLELES;

/// Sizing hints for the look-up tables of a merge session.
///
/// Missing keys fall back to their defaults, so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Merged alleles per site an allele table holds before it must grow.
    pub allele_capacity: usize,
    /// Merged fields a field table is sized for before the first input arrives.
    pub field_capacity: usize,
    /// Log filter handed to the logger when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            allele_capacity: DEFAULT_INIT_NUM_ALLELES,
            field_capacity: 0,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML config file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("allele_capacity must be at least 1; a site always has a reference allele.")]
    ZeroAlleleCapacity,
}

impl MergeConfig {
    /// Rejects values no merge session can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allele_capacity == 0 {
            return Err(ConfigError::ZeroAlleleCapacity);
        }
        Ok(())
    }

    /// Saves the config in a human-readable TOML format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads and validates a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&toml_string)?;
        config.validate()?;
        Ok(config)
    }
}
