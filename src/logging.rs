//! Diagnostics setup
//!
//! The filter comes from `TASKBOARD_LOG` when set, then `--verbose`, then the
//! project's `[log] level`. Commands log to stderr; the interactive board
//! logs to a file so the terminal UI stays intact.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Environment variable holding a log filter
pub const LOG_ENV: &str = "TASKBOARD_LOG";

const DEFAULT_LEVEL: &str = "warn";

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Picks the filter directive by precedence
fn directive(env: Option<String>, verbose: bool, configured: &str) -> String {
    match env {
        Some(env) if !env.trim().is_empty() => env,
        _ if verbose => "debug".to_string(),
        _ if !configured.trim().is_empty() => configured.to_string(),
        _ => DEFAULT_LEVEL.to_string(),
    }
}

/// Parses a directive, falling back to `warn` when it is malformed
fn parse_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Builds the filter from the environment and the command line
pub fn filter(verbose: bool, configured: &str) -> EnvFilter {
    parse_filter(&directive(std::env::var(LOG_ENV).ok(), verbose, configured))
}

/// Installs the global subscriber
pub fn init(target: &LogTarget, verbose: bool, configured: &str) -> Result<()> {
    let filter = filter(verbose, configured);

    match target {
        LogTarget::Stderr => registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .context("Failed to install log subscriber")?,
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;

            registry()
                .with(filter)
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
                .context("Failed to install log subscriber")?
        }
    }

    Ok(())
}
