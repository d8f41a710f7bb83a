//! Domain models for taskboard
//!
//! Contains the core business logic without any I/O concerns.

mod id;
mod task;

pub use id::{IdError, TaskId};
pub use task::{StatusParseError, Task, TaskStatus};
