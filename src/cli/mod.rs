//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Task | Work item management | `task add`, `task assign`, `task done` |
//! | Board | Kanban view and moves | `board show`, `board move`, `board tui` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Use `--verbose` (or `-v`) for debug logs, or set `TASKBOARD_LOG`:
//! ```bash
//! TASKBOARD_LOG=taskboard=debug taskboard board move t-1a2b3c4 done
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod board;
mod output;
mod task;
mod tui;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
