//! Errors raised while reading or merging rolegraph configuration

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("cannot read rolegraph config {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A config file is not valid TOML or does not match `RolegraphConfig`.
    #[error("invalid rolegraph config {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The built-in defaults could not be turned into a config source.
    #[error("cannot seed configuration defaults: {0}")]
    MergeError(String),
}
