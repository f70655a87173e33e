//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while splitting or parsing front matter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// YAML failed to parse.
    #[error("front matter parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Top-level YAML node was not a mapping.
    #[error("front matter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Errors raised while loading the sibling configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid YAML in `{0}`")]
    Yaml(PathBuf, #[source] serde_yaml::Error),

    #[error("`{0}` must be a YAML mapping at the top level")]
    InvalidRootType(PathBuf),
}
