//! Optimistic move with a single compensating action
//!
//! An [`OptimisticMove`] walks `Idle -> Applied -> Confirming` and then ends
//! in either `Committed` or `RolledBack`. The compensation is captured when
//! the move is applied and runs at most once.

use std::sync::Arc;

use super::item::{set_column_by_id, BoardItem};

/// Where an optimistic move is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    Idle,
    Applied,
    Confirming,
    Committed,
    RolledBack,
}

type Compensation<T> = Box<dyn FnOnce(&mut Vec<T>) -> bool + Send>;

pub(crate) struct OptimisticMove<T: BoardItem> {
    item_id: String,
    phase: MovePhase,
    compensate: Option<Compensation<T>>,
}

impl<T: BoardItem> OptimisticMove<T> {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            phase: MovePhase::Idle,
            compensate: None,
        }
    }

    pub fn phase(&self) -> MovePhase {
        self.phase
    }

    /// Moves the item to `to` on a fresh copy of the board and records how
    /// to put it back in `from`. Returns false (and stays `Idle`) if the item
    /// is not on the board.
    pub fn apply(&mut self, items: &mut Arc<Vec<T>>, from: T::Column, to: T::Column) -> bool {
        if self.phase != MovePhase::Idle {
            return false;
        }

        let mut next = Vec::clone(items);
        if !set_column_by_id(&mut next, &self.item_id, to) {
            return false;
        }
        *items = Arc::new(next);

        let id = self.item_id.clone();
        self.compensate = Some(Box::new(move |items: &mut Vec<T>| {
            set_column_by_id(items, &id, from)
        }));
        self.phase = MovePhase::Applied;
        true
    }

    pub fn begin_confirm(&mut self) {
        if self.phase == MovePhase::Applied {
            self.phase = MovePhase::Confirming;
        }
    }

    /// Keeps the optimistic state and drops the compensation
    pub fn commit(&mut self) {
        if self.compensate.take().is_some() {
            self.phase = MovePhase::Committed;
        }
    }

    /// Runs the compensation against the current board.
    ///
    /// Targets the item by id, so unrelated changes made while confirming are
    /// kept. Returns false if the item has since left the board.
    pub fn roll_back(&mut self, items: &mut Arc<Vec<T>>) -> bool {
        let Some(compensate) = self.compensate.take() else {
            return false;
        };
        self.phase = MovePhase::RolledBack;

        let mut next = Vec::clone(items);
        if compensate(&mut next) {
            *items = Arc::new(next);
            true
        } else {
            false
        }
    }
}
