//! Task board: tasks projected onto the generic board engine
//!
//! Each task becomes a [`TaskCard`] whose column is its status. Moving a
//! card between columns asks a [`StatusService`] to change the task's status.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::drag::{DragEnd, DragStart, MoveOutcome, MoveRequest};
use super::engine::{BoardEngine, MoveHandler};
use super::item::{column_resolver, BoardItem};
use crate::domain::{Task, TaskId, TaskStatus};

/// A task as it sits on the board
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCard {
    pub id: String,
    pub column: TaskStatus,
    pub name: String,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// The task this card was projected from, untouched
    pub raw: Task,
}

impl BoardItem for TaskCard {
    type Column = TaskStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn column(&self) -> TaskStatus {
        self.column
    }

    fn set_column(&mut self, column: TaskStatus) {
        self.column = column;
    }
}

impl From<&Task> for TaskCard {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            column: task.status,
            name: task.title.clone(),
            assignee: task.assignee.clone(),
            due_date: task.due_date,
            raw: task.clone(),
        }
    }
}

/// Maps tasks to cards, preserving order
pub fn project(tasks: &[Task]) -> Vec<TaskCard> {
    tasks.iter().map(TaskCard::from).collect()
}

/// A column id is valid iff it names a task status
pub fn status_column(id: &str) -> Option<TaskStatus> {
    id.parse().ok()
}

/// Changes a task's status wherever tasks are kept
#[async_trait]
pub trait StatusService: Send + Sync {
    async fn change_status(&self, task: &Task, status: TaskStatus) -> Result<()>;
}

#[async_trait]
impl<S: StatusService + ?Sized> StatusService for Arc<S> {
    async fn change_status(&self, task: &Task, status: TaskStatus) -> Result<()> {
        (**self).change_status(task, status).await
    }
}

/// Move handler that turns a card move into a status change
pub struct StatusMove<S> {
    service: S,
}

/// Binds a status service to the engine's move signature
pub fn bind_move<S: StatusService>(service: S) -> StatusMove<S> {
    StatusMove { service }
}

#[async_trait]
impl<S: StatusService> MoveHandler<TaskCard> for StatusMove<S> {
    async fn move_item(&self, request: MoveRequest<TaskCard>) -> Result<()> {
        self.service.change_status(&request.item.raw, request.to).await
    }
}

/// Board of task cards backed by a status service
#[derive(Clone)]
pub struct TaskBoard {
    engine: BoardEngine<TaskCard>,
}

impl TaskBoard {
    pub fn new<S>(tasks: &[Task], service: S) -> Self
    where
        S: StatusService + 'static,
    {
        Self {
            engine: BoardEngine::new(
                project(tasks),
                column_resolver(status_column),
                bind_move(service),
            ),
        }
    }

    /// Reconciles the board with a fresh task list
    pub fn sync(&self, tasks: &[Task]) -> bool {
        self.engine.reconcile(project(tasks))
    }

    pub fn items(&self) -> Arc<Vec<TaskCard>> {
        self.engine.items()
    }

    /// Cards in `status`, in board order
    pub fn column(&self, status: TaskStatus) -> Vec<TaskCard> {
        self.engine
            .items()
            .iter()
            .filter(|card| card.column == status)
            .cloned()
            .collect()
    }

    pub fn card(&self, id: &TaskId) -> Option<TaskCard> {
        self.engine.item(&id.to_string())
    }

    pub fn on_drag_start(&self, event: &DragStart) {
        self.engine.on_drag_start(event);
    }

    pub async fn on_drag_end(&self, event: DragEnd) -> MoveOutcome<TaskStatus> {
        self.engine.on_drag_end(event).await
    }

    pub fn move_optimistic(&self, id: &TaskId, status: TaskStatus) -> bool {
        self.engine.move_optimistic(&id.to_string(), status)
    }

    pub fn engine(&self) -> &BoardEngine<TaskCard> {
        &self.engine
    }
}
