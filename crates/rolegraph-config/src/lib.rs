//! Loads the [`GraphConfig`] a host application builds its role graph with.
//!
//! Precedence, highest first: `ROLEGRAPH_*` variables,
//! `rolegraph.local.toml`, `rolegraph.toml`, built-in defaults. The engine
//! crate itself never reads files or the environment.

use anyhow::Result;
use rolegraph_rbac::{GraphConfig, RoleGraph};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX, LOCAL_FILE, PROJECT_FILE};

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolegraphConfig {
    pub graph: GraphConfig,
}

impl RolegraphConfig {
    /// Merges the project files of the working directory with the
    /// process environment.
    pub fn load() -> Result<Self> {
        Self::load_from_dir(std::env::current_dir()?)
    }

    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::for_project(project_dir).load()
    }

    /// Read a single TOML file, without merging other sources
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Create an empty role graph using this configuration
    pub fn build_graph(&self) -> RoleGraph {
        RoleGraph::with_config(self.graph.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = RolegraphConfig::default();
        assert!(config.graph.reject_cycles);
        assert!(config.graph.trace_mutations);
    }

    #[test]
    fn test_from_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("rolegraph.toml");
        fs::write(&path, "[graph]\nreject_cycles = false\n").expect("Failed to write config");

        let config = RolegraphConfig::from_file(&path).expect("Failed to read config");

        assert!(!config.graph.reject_cycles);
        assert!(config.graph.trace_mutations);
    }

    #[test]
    fn test_from_file_errors() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("missing.toml");
        assert!(matches!(
            RolegraphConfig::from_file(&missing),
            Err(ConfigError::ReadError { .. })
        ));

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "[graph\nreject_cycles = ").expect("Failed to write config");
        assert!(matches!(
            RolegraphConfig::from_file(&broken),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_load_from_dir_reads_project_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            temp_dir.path().join(PROJECT_FILE),
            "[graph]\ntrace_mutations = false\n",
        )
        .expect("Failed to write config");

        let config = RolegraphConfig::load_from_dir(temp_dir.path()).expect("Failed to load");

        assert!(!config.graph.trace_mutations);
    }

    #[test]
    fn test_build_graph_uses_config() {
        let config = RolegraphConfig {
            graph: GraphConfig::quiet(),
        };
        let graph = config.build_graph();

        assert!(graph.is_empty());
        assert_eq!(graph.config(), &GraphConfig::quiet());
    }
}
