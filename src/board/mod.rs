//! # Board State
//!
//! Keeps a locally mutable kanban board in step with an authoritative item
//! list, and moves items between columns optimistically.
//!
//! ## Layers
//!
//! | Layer | Module | Role |
//! |-------|--------|------|
//! | Engine | `engine` | Generic board, drag protocol, optimistic apply / confirm / rollback |
//! | Projection | `tasks` | Tasks as cards, status changes as moves |
//!
//! ## Drag protocol
//!
//! ```text
//! Idle -> DragActive -> DropResolved -> OptimisticApplied -> Confirming -> Committed | RolledBack
//!             \-> Idle  (no target, unknown item, unresolved or same column)
//! ```
//!
//! The board is only mutated through [`BoardEngine::reconcile`],
//! [`BoardEngine::on_drag_end`] and [`BoardEngine::move_optimistic`].
//! Whichever of reconcile, commit or rollback lands last determines what is
//! displayed.
//!
//! While an item's move is confirming, further drags of that item are
//! ignored with [`IgnoreReason::InFlight`].

mod drag;
mod engine;
mod item;
mod tasks;
mod transaction;

pub use drag::{DragEnd, DragStart, DropTarget, IgnoreReason, MoveOutcome, MoveRequest};
pub use engine::{move_fn, BoardEngine, MoveFn, MoveHandler};
pub use item::{column_resolver, BoardItem, Column, ColumnResolver};
pub use tasks::{bind_move, project, status_column, StatusMove, StatusService, TaskBoard, TaskCard};
pub use transaction::MovePhase;
