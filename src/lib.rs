//! taskboard - a local kanban board for tasks
//!
//! Keeps a locally mutable board in step with the task store and moves
//! cards between status columns optimistically: the board changes at once,
//! the store confirms in the background, and a refused move is rolled back.

pub mod board;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod storage;

pub use board::{BoardEngine, MoveOutcome, TaskBoard};
pub use domain::{Task, TaskId, TaskStatus};
