//! # Storage Layer
//!
//! Persistence for taskboard with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSONL (one JSON per line) | `.taskboard/tasks.jsonl` |
//! | Config | TOML | `.taskboard/config.toml` |
//! | Board log | Text | `.taskboard/board.log` |
//!
//! ## Concurrency Safety
//!
//! - [`TaskStore`] uses file locking (`fs2`) for concurrent access
//! - Full rewrites are atomic (temp file + rename)
//! - [`StoreStatusService`] runs store writes on the blocking pool
//!
//! ## Project Structure
//!
//! ```text
//! .taskboard/
//! ├── tasks.jsonl           # All tasks in JSONL format
//! ├── tasks.lock            # Held by every store read and write
//! ├── config.toml           # Project configuration
//! ├── board.log             # Interactive board diagnostics
//! └── .gitignore            # Ignores the log, lock and temp files
//! ```

mod config;
mod jsonl;
mod project;
mod status;

pub use config::{BoardConfig, Config, ConfigError, FormatSetting, GlobalConfig, LogConfig, ProjectConfig};
pub use jsonl::TaskStore;
pub use project::{Project, ProjectError};
pub use status::{StatusChangeError, StoreStatusService};
