//! Drag lifecycle events and move results

use std::fmt;

use super::item::BoardItem;

/// Emitted when the user picks up an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragStart {
    pub active_id: String,
}

impl DragStart {
    pub fn new(active_id: impl Into<String>) -> Self {
        Self {
            active_id: active_id.into(),
        }
    }
}

/// What the item was released over.
///
/// `id` may name a column or another item. `container_id` is the optional
/// hint a sortable container attaches to its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub id: String,
    pub container_id: Option<String>,
}

impl DropTarget {
    /// A drop directly onto a column or item with no container hint
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            container_id: None,
        }
    }

    /// A drop onto an item inside a container
    pub fn in_container(id: impl Into<String>, container_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            container_id: Some(container_id.into()),
        }
    }
}

/// Emitted when the user releases an item. `over` is `None` when the drag
/// was cancelled or released outside any target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub active_id: String,
    pub over: Option<DropTarget>,
}

impl DragEnd {
    pub fn over(active_id: impl Into<String>, target: DropTarget) -> Self {
        Self {
            active_id: active_id.into(),
            over: Some(target),
        }
    }

    pub fn cancelled(active_id: impl Into<String>) -> Self {
        Self {
            active_id: active_id.into(),
            over: None,
        }
    }
}

/// Column an in-progress drag started from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DragOrigin<C> {
    pub id: String,
    pub from: C,
}

/// Handed to the move handler for one confirmation attempt
#[derive(Debug, Clone)]
pub struct MoveRequest<T: BoardItem> {
    /// The item as it was before the optimistic update
    pub item: T,
    pub from: T::Column,
    pub to: T::Column,
}

/// Why a drag-end left the board untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Released outside any drop target
    NoTarget,
    /// The dragged item is no longer on the board
    UnknownItem,
    /// The drop target maps to no column
    Unresolved,
    /// Dropped back into its own column
    SameColumn,
    /// A previous move of the same item is still confirming
    InFlight,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::NoTarget => "no drop target",
            IgnoreReason::UnknownItem => "item not on board",
            IgnoreReason::Unresolved => "drop target is not a column",
            IgnoreReason::SameColumn => "same column",
            IgnoreReason::InFlight => "previous move still confirming",
        };
        f.write_str(text)
    }
}

/// Result of one drag-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome<C> {
    /// The move handler confirmed; the optimistic state stands
    Committed { from: C, to: C },
    /// The move handler failed; the item was put back in `from`
    RolledBack { from: C, to: C, error: String },
    /// Nothing was mutated
    Ignored(IgnoreReason),
}

impl<C> MoveOutcome<C> {
    pub fn is_committed(&self) -> bool {
        matches!(self, MoveOutcome::Committed { .. })
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, MoveOutcome::RolledBack { .. })
    }

    pub fn ignored_reason(&self) -> Option<IgnoreReason> {
        match self {
            MoveOutcome::Ignored(reason) => Some(*reason),
            _ => None,
        }
    }
}
