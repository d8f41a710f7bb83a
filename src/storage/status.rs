//! Store-backed status changes
//!
//! Status writes touch the JSONL file under an exclusive lock, so they run on
//! tokio's blocking pool rather than on an async worker.

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::TaskStore;
use crate::board::StatusService;
use crate::domain::{Task, TaskId, TaskStatus};

#[derive(Debug, Error)]
pub enum StatusChangeError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
}

/// Changes task status in a [`TaskStore`]
#[derive(Debug, Clone)]
pub struct StoreStatusService {
    store: TaskStore,
}

impl StoreStatusService {
    pub fn new(store: TaskStore) -> Self {
        Self { store }
    }

    fn write_status(store: &TaskStore, id: &TaskId, status: TaskStatus) -> Result<Task> {
        let task = store
            .modify_task(id, |task| task.set_status(status))?
            .ok_or_else(|| StatusChangeError::TaskNotFound(id.clone()))?;
        Ok(task)
    }
}

#[async_trait]
impl StatusService for StoreStatusService {
    async fn change_status(&self, task: &Task, status: TaskStatus) -> Result<()> {
        let store = self.store.clone();
        let id = task.id.clone();

        let updated = tokio::task::spawn_blocking(move || Self::write_status(&store, &id, status))
            .await
            .context("Status update task panicked")??;

        debug!(task_id = %updated.id, %status, "status written");
        Ok(())
    }
}
