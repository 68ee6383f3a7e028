//! Layered loading of [`RolegraphConfig`].
//!
//! Later layers win: built-in defaults, then each TOML file in the order it
//! was added, then environment variables.

use crate::{ConfigError, RolegraphConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Project file, usually checked in.
pub const PROJECT_FILE: &str = "rolegraph.toml";

/// Machine-local overrides, usually gitignored.
pub const LOCAL_FILE: &str = "rolegraph.local.toml";

/// Environment prefix; `ROLEGRAPH_GRAPH__REJECT_CYCLES=false` sets
/// `graph.reject_cycles`.
pub const ENV_PREFIX: &str = "ROLEGRAPH";

pub struct ConfigLoader {
    files: Vec<PathBuf>,
    env_prefix: String,
    env_vars: Option<config::Map<String, String>>,
}

impl ConfigLoader {
    /// Loader with no files, reading the process environment.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            env_prefix: ENV_PREFIX.to_string(),
            env_vars: None,
        }
    }

    /// Loader for `rolegraph.toml` and `rolegraph.local.toml` inside `dir`.
    pub fn for_project(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new()
            .with_file(dir.join(PROJECT_FILE))
            .with_file(dir.join(LOCAL_FILE))
    }

    /// Adds a TOML layer above the files added so far. Missing files are
    /// skipped when loading.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Reads variables from `vars` instead of the process environment.
    pub fn with_env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Files that exist and will be merged, lowest precedence first.
    pub fn layers(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .map(PathBuf::as_path)
            .filter(|path| path.is_file())
    }

    pub fn load(&self) -> Result<RolegraphConfig> {
        let defaults = config::Config::try_from(&RolegraphConfig::default())
            .map_err(|e| ConfigError::MergeError(e.to_string()))?;
        let mut builder = config::Config::builder().add_source(defaults);

        for path in self.layers() {
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(self.env_vars.clone()),
        );

        let merged = builder
            .build()
            .with_context(|| format!("merging rolegraph config ({} files)", self.layers().count()))?;
        merged
            .try_deserialize()
            .context("rolegraph config does not match the expected shape")
    }

    /// Falls back to the defaults when any layer is invalid.
    pub fn load_or_default(&self) -> RolegraphConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
