//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, StoreStatusService, TaskStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a taskboard project. Run 'taskboard init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# taskboard project configuration

# Assignee given to new tasks when --assignee is not passed
# default_assignee = "you"

[board]
# Show the Done column
show_done = true
# Redraw interval of the interactive board, in milliseconds
tick_rate_ms = 250

[log]
# Log filter; TASKBOARD_LOG overrides it
level = "warn"
"#;

const GITIGNORE: &str = r#"# Interactive board diagnostics
board.log

# Store lock and interrupted writes
tasks.lock
*.tmp
"#;

/// A taskboard project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let board_dir = root.join(".taskboard");

        if !board_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path.
    ///
    /// Existing files are left alone, so running it twice is harmless.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let board_dir = root.join(".taskboard");

        fs::create_dir_all(&board_dir).with_context(|| {
            format!(
                "Failed to create .taskboard directory: {}",
                board_dir.display()
            )
        })?;

        let config_path = board_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = board_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .taskboard directory path
    pub fn board_dir(&self) -> PathBuf {
        self.root.join(".taskboard")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the task store
    pub fn task_store(&self) -> TaskStore {
        TaskStore::for_project(&self.root)
    }

    /// Returns a status service writing to this project's task store
    pub fn status_service(&self) -> StoreStatusService {
        StoreStatusService::new(self.task_store())
    }

    /// Where the interactive board of the project at `root` writes its
    /// diagnostics
    pub fn log_path_for(root: &Path) -> PathBuf {
        root.join(".taskboard").join("board.log")
    }
}
