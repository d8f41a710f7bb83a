//! Board CLI commands

use anyhow::Result;
use clap::Subcommand;
use tokio::runtime::Runtime;

use super::output::Output;
use super::tui;
use crate::board::{DragEnd, DragStart, DropTarget, MoveOutcome, TaskBoard, TaskCard};
use crate::domain::TaskStatus;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum BoardCommands {
    /// Show tasks grouped by status column
    Show {
        /// Include the Done column even if the config hides it
        #[arg(long, short)]
        all: bool,
    },

    /// Drag a task onto a column or onto another task
    ///
    /// Examples:
    ///   taskboard board move t-1a2b3c4 done
    ///   taskboard board move t-1a2b3c4 t-9f8e7d6
    ///   taskboard board move t-1a2b3c4 t-9f8e7d6 --container in_progress
    Move {
        /// Task to drag
        id: String,

        /// Drop target: a status (todo, in_progress, done) or a task ID
        target: String,

        /// Column the drop target sits in, if known
        #[arg(long)]
        container: Option<String>,
    },

    /// Open the interactive kanban board
    Tui,
}

pub fn run(cmd: BoardCommands, output: &Output, runtime: &Runtime) -> Result<()> {
    match cmd {
        BoardCommands::Show { all } => show_board(output, all),
        BoardCommands::Move {
            id,
            target,
            container,
        } => move_task(output, runtime, &id, &target, container),
        BoardCommands::Tui => {
            let project = Project::open_current()?;
            tui::run(project, runtime.handle().clone())
        }
    }
}

/// Opens the task board over the current store contents
fn open_board(project: &Project) -> Result<TaskBoard> {
    let tasks = project.task_store().list()?;
    Ok(TaskBoard::new(&tasks, project.status_service()))
}

fn card_json(card: &TaskCard) -> serde_json::Value {
    serde_json::json!({
        "id": card.id,
        "name": card.name,
        "assignee": card.assignee,
        "due_date": card.due_date,
    })
}

fn show_board(output: &Output, all: bool) -> Result<()> {
    let project = Project::open_current()?;
    let board = open_board(&project)?;
    let show_done = all || project.config().project.board.show_done;

    let columns: Vec<(TaskStatus, Vec<TaskCard>)> = TaskStatus::ALL
        .into_iter()
        .filter(|status| show_done || !status.is_complete())
        .map(|status| (status, board.column(status)))
        .collect();

    if output.is_json() {
        let items: Vec<_> = columns
            .iter()
            .map(|(status, cards)| {
                serde_json::json!({
                    "status": status,
                    "label": status.label(),
                    "cards": cards.iter().map(card_json).collect::<Vec<_>>(),
                })
            })
            .collect();
        output.data(&serde_json::json!({ "columns": items }));
        return Ok(());
    }

    for (i, (status, cards)) in columns.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} ({})", status.label(), cards.len());
        println!("{}", "-".repeat(40));
        if cards.is_empty() {
            println!("  (empty)");
        }
        for card in cards {
            let mut line = format!("  {:<12} {}", card.id, card.name);
            if let Some(assignee) = &card.assignee {
                line.push_str(&format!(" @{}", assignee));
            }
            if let Some(due) = card.due_date {
                line.push_str(&format!(" (due {})", due.format("%Y-%m-%d")));
            }
            println!("{}", line);
        }
    }

    Ok(())
}

fn move_task(
    output: &Output,
    runtime: &Runtime,
    id: &str,
    target: &str,
    container: Option<String>,
) -> Result<()> {
    let project = Project::open_current()?;
    let board = open_board(&project)?;

    let over = match container {
        Some(container) => DropTarget::in_container(target, container),
        None => DropTarget::new(target),
    };

    board.on_drag_start(&DragStart::new(id));
    let outcome = runtime.block_on(board.on_drag_end(DragEnd::over(id, over)));

    report(output, id, &outcome)
}

/// Prints a move outcome. A rollback is reported and then fails the command.
fn report(output: &Output, id: &str, outcome: &MoveOutcome<TaskStatus>) -> Result<()> {
    match outcome {
        MoveOutcome::Committed { from, to } => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": id,
                    "outcome": "committed",
                    "from": from,
                    "to": to,
                }));
            } else {
                output.success(&format!("Moved {}: {} -> {}", id, from.label(), to.label()));
            }
            Ok(())
        }
        MoveOutcome::Ignored(reason) => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": id,
                    "outcome": "ignored",
                    "reason": reason.to_string(),
                }));
            } else {
                output.success(&format!("Nothing moved: {}", reason));
            }
            Ok(())
        }
        MoveOutcome::RolledBack { from, to, error } => {
            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": id,
                    "outcome": "rolled_back",
                    "from": from,
                    "to": to,
                    "error": error,
                }));
            }
            anyhow::bail!(
                "Move of {} to {} rolled back: {}",
                id,
                to.label(),
                error
            )
        }
    }
}
