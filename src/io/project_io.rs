use std::fs;
use std::path::{Path, PathBuf};

use crate::io::persist::Persistence;
use crate::io::storage::DirStore;
use crate::model::config::Config;
use crate::store::Planner;

/// Name of the data directory `dp` looks for.
pub const DATA_DIR_NAME: &str = ".dayplan";

/// Configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Error type for locating and opening a data directory
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("no .dayplan/ directory found (run `dp init` first)")]
    NotAProject,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A located data directory with its configuration
#[derive(Debug, Clone)]
pub struct Workspace {
    /// The `.dayplan/` directory itself
    pub data_dir: PathBuf,
    pub config: Config,
}

impl Workspace {
    /// Open the store backed by this directory, loading both collections.
    pub fn planner(&self) -> Planner<DirStore> {
        let persistence = Persistence::new(
            DirStore::new(&self.data_dir),
            &self.config.storage,
            &self.config.topics.default_color,
        );
        Planner::open(persistence)
    }
}

/// Walk up from `start` looking for a `.dayplan/` directory. `start` may
/// also be the data directory itself.
pub fn discover_data_dir(start: &Path) -> Result<PathBuf, ProjectError> {
    if start.file_name().is_some_and(|n| n == DATA_DIR_NAME) && start.is_dir() {
        return Ok(start.to_path_buf());
    }
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(DATA_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

/// Read `config.toml`; a missing file means all defaults.
pub fn load_config(data_dir: &Path) -> Result<Config, ProjectError> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ProjectError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Discover and load the workspace containing `start`.
pub fn open_workspace(start: &Path) -> Result<Workspace, ProjectError> {
    let data_dir = discover_data_dir(start)?;
    let config = load_config(&data_dir)?;
    Ok(Workspace { data_dir, config })
}
