//! Engine configuration, read from TOML with environment overrides.
use crate::compute::Direction;
use crate::error::{FlowGraphError, Result};
use crate::store::FileGraphStore;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_GRAPH_ROOT: &str = "FLOWGRAPH_GRAPH_ROOT";
pub const ENV_LOG: &str = "FLOWGRAPH_LOG";

pub const DEFAULT_GRAPH_ROOT: &str = "graphs";
pub const DEFAULT_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the snapshot files.
    pub graph_root: PathBuf,
    /// Amounts down to `-tolerance` count as zero.
    pub tolerance: f64,
    /// Direction of the first propagation pass.
    pub first_direction: Direction,
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            graph_root: PathBuf::from(DEFAULT_GRAPH_ROOT),
            tolerance: DEFAULT_TOLERANCE,
            first_direction: Direction::Upstream,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|err| FlowGraphError::Config(err.to_string()))?;
        config.checked()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| FlowGraphError::Config(format!("cannot read {}: {}", path.display(), err)))?;
        Self::from_toml_str(&content)
    }

    /// Defaults, or the TOML file at `path`, with environment overrides on top.
    pub fn from_sources(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Snapshot store rooted at `graph_root`.
    pub fn file_store(&self) -> FileGraphStore {
        FileGraphStore::new(&self.graph_root)
    }

    /// Applies `FLOWGRAPH_GRAPH_ROOT` and `FLOWGRAPH_LOG` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, mut getter: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(root) = getter(ENV_GRAPH_ROOT).filter(|v| !v.trim().is_empty()) {
            self.graph_root = PathBuf::from(root);
        }
        if let Some(filter) = getter(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
        self
    }

    fn checked(self) -> Result<Self> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(FlowGraphError::Config(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(self)
    }
}
