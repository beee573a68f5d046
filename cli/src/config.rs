//! YAML configuration for the special characters.
//!
//! ```yaml
//! flag_prefix: "/"
//! assignment: ":"
//! ```

use std::io::BufReader;
use std::path::Path;

use argspec_core::{ParseError, SpecialChars};
use thiserror::Error;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The characters parsed but cannot be used together.
    #[error("invalid special characters: {0}")]
    Invalid(#[from] ParseError),
}

/// Loads and validates special characters from a YAML file.
///
/// Omitted fields keep their defaults.
pub fn load(path: impl AsRef<Path>) -> Result<SpecialChars, ConfigError> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let specials: SpecialChars = serde_yaml::from_reader(reader)?;
    specials.validate()?;
    Ok(specials)
}

/// Loads `path` if given, otherwise the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<SpecialChars, ConfigError> {
    match path {
        Some(path) => load(path),
        None => Ok(SpecialChars::default()),
    }
}
