//! Task CLI commands

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use tracing::debug;

use super::output::Output;
use crate::domain::{Task, TaskId, TaskStatus};
use crate::storage::{Project, TaskStore};

/// Argument value that clears an optional field
const CLEAR: &str = "-";

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Examples:
    ///   taskboard task add "Fix typo"
    ///   taskboard task add "Build API" --assignee ada --due 2025-03-01
    Add {
        /// Task title
        title: String,

        /// Who works on it (defaults to the configured default_assignee)
        #[arg(long, short)]
        assignee: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Longer description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List tasks in board order
    List {
        /// Only tasks with this status (todo, in_progress, done)
        #[arg(long, short)]
        status: Option<TaskStatus>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Mark task as in progress
    Start {
        /// Task ID
        id: String,
    },

    /// Mark task as done
    Done {
        /// Task ID
        id: String,
    },

    /// Move a done task back to todo
    Reopen {
        /// Task ID
        id: String,
    },

    /// Set or clear the assignee
    Assign {
        /// Task ID
        id: String,

        /// Assignee name, or "-" to clear
        name: String,
    },

    /// Set or clear the due date
    Due {
        /// Task ID
        id: String,

        /// Due date (YYYY-MM-DD), or "-" to clear
        date: String,
    },

    /// Remove a task
    Remove {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            title,
            assignee,
            due,
            description,
        } => add_task(output, &title, assignee, due.as_deref(), description),
        TaskCommands::List { status } => list_tasks(output, status),
        TaskCommands::Show { id } => show_task(output, &id),
        TaskCommands::Start { id } => change_status(output, &id, TaskStatus::InProgress),
        TaskCommands::Done { id } => change_status(output, &id, TaskStatus::Done),
        TaskCommands::Reopen { id } => change_status(output, &id, TaskStatus::Todo),
        TaskCommands::Assign { id, name } => assign_task(output, &id, &name),
        TaskCommands::Due { id, date } => set_due(output, &id, &date),
        TaskCommands::Remove { id } => remove_task(output, &id),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Loads a task or fails with "Task not found"
fn load_task(store: &TaskStore, id_str: &str) -> Result<Task> {
    let id: TaskId = id_str.parse()?;
    store
        .get(&id)?
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))
}

/// Applies `edit` to a stored task under the store's write lock, failing
/// with "Task not found"
fn edit_task(
    store: &TaskStore,
    id_str: &str,
    edit: impl FnOnce(&mut Task) -> bool,
) -> Result<Task> {
    let id: TaskId = id_str.parse()?;
    store
        .modify_task(&id, edit)?
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id.to_string(),
        "title": task.title,
        "status": task.status,
        "assignee": task.assignee,
        "due_date": task.due_date,
    })
}

fn add_task(
    output: &Output,
    title: &str,
    assignee: Option<String>,
    due: Option<&str>,
    description: Option<String>,
) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.task_store();

    if title.trim().is_empty() {
        anyhow::bail!("Task title cannot be empty");
    }

    let mut task = Task::new(title);
    let assignee = assignee.or_else(|| project.config().project.default_assignee.clone());
    if assignee.is_some() {
        task.set_assignee(assignee);
    }
    if let Some(due) = due {
        task.set_due_date(Some(parse_date(due)?));
    }
    if let Some(description) = description {
        task.set_description(description);
    }

    store.append(&task)?;
    debug!(task_id = %task.id, "task added");

    if output.is_json() {
        output.data(&task_json(&task));
    } else {
        output.success(&format!("Created task: {} - {}", task.id, task.title));
    }

    Ok(())
}

fn list_tasks(output: &Output, status: Option<TaskStatus>) -> Result<()> {
    let project = Project::open_current()?;
    let tasks: Vec<Task> = project
        .task_store()
        .list()?
        .into_iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .collect();

    if output.is_json() {
        let items: Vec<_> = tasks.iter().map(task_json).collect();
        output.data(&items);
    } else if tasks.is_empty() {
        match status {
            Some(status) => println!("No {} tasks", status.label().to_lowercase()),
            None => println!("No tasks"),
        }
    } else {
        println!("{:<12} {:<12} {:<12} {:<10} TITLE", "ID", "STATUS", "ASSIGNEE", "DUE");
        println!("{}", "-".repeat(70));

        for task in &tasks {
            println!(
                "{:<12} {:<12} {:<12} {:<10} {}",
                task.id,
                task.status,
                task.assignee.as_deref().unwrap_or("-"),
                task.due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                task.title
            );
        }
    }

    Ok(())
}

fn show_task(output: &Output, id_str: &str) -> Result<()> {
    let project = Project::open_current()?;
    let task = load_task(&project.task_store(), id_str)?;
    let overdue = task.is_overdue(Utc::now().date_naive());

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id.to_string(),
            "title": task.title,
            "status": task.status,
            "assignee": task.assignee,
            "due_date": task.due_date,
            "overdue": overdue,
            "description": task.description,
            "created_at": task.created_at,
            "updated_at": task.updated_at,
            "completed_at": task.completed_at,
        }));
    } else {
        println!("Task: {}", task.id);
        println!("Title: {}", task.title);
        println!("Status: {}", task.status.label());
        if let Some(assignee) = &task.assignee {
            println!("Assignee: {}", assignee);
        }
        if let Some(due) = task.due_date {
            let marker = if overdue { " (overdue)" } else { "" };
            println!("Due: {}{}", due.format("%Y-%m-%d"), marker);
        }
        println!("Created: {}", task.created_at.format("%Y-%m-%d %H:%M"));
        println!("Updated: {}", task.updated_at.format("%Y-%m-%d %H:%M"));

        if let Some(completed) = task.completed_at {
            println!("Completed: {}", completed.format("%Y-%m-%d %H:%M"));
        }

        if let Some(desc) = &task.description {
            println!("\nDescription:");
            println!("{}", desc);
        }
    }

    Ok(())
}

fn change_status(output: &Output, id_str: &str, status: TaskStatus) -> Result<()> {
    let project = Project::open_current()?;
    let task = edit_task(&project.task_store(), id_str, |task| task.set_status(status))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id.to_string(),
            "status": task.status,
            "completed_at": task.completed_at,
        }));
    } else {
        output.success(&format!("{} is now {}", task.id, task.status.label()));
    }

    Ok(())
}

fn assign_task(output: &Output, id_str: &str, name: &str) -> Result<()> {
    let project = Project::open_current()?;
    let assignee = (name != CLEAR).then(|| name.to_string());
    let task = edit_task(&project.task_store(), id_str, |task| {
        task.set_assignee(assignee);
        true
    })?;

    if output.is_json() {
        output.data(&task_json(&task));
    } else {
        match &task.assignee {
            Some(assignee) => output.success(&format!("Assigned {} to {}", task.id, assignee)),
            None => output.success(&format!("Unassigned {}", task.id)),
        }
    }

    Ok(())
}

fn set_due(output: &Output, id_str: &str, date: &str) -> Result<()> {
    let project = Project::open_current()?;
    let due = if date == CLEAR { None } else { Some(parse_date(date)?) };
    let task = edit_task(&project.task_store(), id_str, |task| {
        task.set_due_date(due);
        true
    })?;

    if output.is_json() {
        output.data(&task_json(&task));
    } else {
        match task.due_date {
            Some(due) => output.success(&format!("{} is due {}", task.id, due.format("%Y-%m-%d"))),
            None => output.success(&format!("Cleared due date of {}", task.id)),
        }
    }

    Ok(())
}

fn remove_task(output: &Output, id_str: &str) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.task_store();

    let id: TaskId = id_str.parse()?;
    if !store.remove(&id)? {
        anyhow::bail!("Task not found: {}", id);
    }

    if output.is_json() {
        output.data(&serde_json::json!({ "id": id.to_string(), "removed": true }));
    } else {
        output.success(&format!("Removed task: {}", id));
    }

    Ok(())
}
