//! Main CLI application structure

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use super::board::{self, BoardCommands};
use super::output::{Output, OutputFormat};
use super::task;
use crate::logging::{self, LogTarget};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(author, version, about = "Local kanban board for tasks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new taskboard project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// View and rearrange the kanban board
    #[command(subcommand)]
    Board(BoardCommands),
}

/// Chooses where logs go for a command
fn log_target(command: &Commands, config: &Config) -> LogTarget {
    match (command, config.project_root.as_deref()) {
        (Commands::Board(BoardCommands::Tui), Some(root)) => {
            LogTarget::File(Project::log_path_for(root))
        }
        _ => LogTarget::Stderr,
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    logging::init(
        &log_target(&cli.command, &config),
        cli.verbose,
        &config.project.log.level,
    )?;

    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format);

    debug!(project_root = ?config.project_root, "taskboard starting");

    match cli.command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            debug!(board_dir = %project.board_dir().display(), "project initialized");
            output.success(&format!(
                "Initialized taskboard project at {}",
                project.root().display()
            ));
        }

        Commands::Task(cmd) => task::run(cmd, &output)?,

        Commands::Board(cmd) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            board::run(cmd, &output, &runtime)?
        }
    }

    debug!("command completed");
    Ok(())
}
