//! Board item contract

use std::fmt;
use std::sync::Arc;

/// A column identifier drawn from a finite, closed set
pub trait Column: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<C> Column for C where C: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// Something that can sit on a board and be dragged between columns
pub trait BoardItem: Clone + Send + Sync + 'static {
    type Column: Column;

    /// Identifier, unique within one board snapshot
    fn id(&self) -> &str;

    /// Column the item currently occupies
    fn column(&self) -> Self::Column;

    /// Moves the item to another column
    fn set_column(&mut self, column: Self::Column);
}

/// Maps a raw identifier to a column, or `None` if it does not name one.
///
/// This is the column-validity predicate for a board: the domain supplies it
/// so the engine can tell column drop targets from item drop targets.
pub type ColumnResolver<C> = Arc<dyn Fn(&str) -> Option<C> + Send + Sync>;

/// Builds a [`ColumnResolver`] from any parsing function
pub fn column_resolver<C, F>(resolve: F) -> ColumnResolver<C>
where
    C: Column,
    F: Fn(&str) -> Option<C> + Send + Sync + 'static,
{
    Arc::new(resolve)
}

/// Sets the column of the item with `id`. Returns false if no such item.
pub(crate) fn set_column_by_id<T: BoardItem>(items: &mut [T], id: &str, column: T::Column) -> bool {
    match items.iter_mut().find(|item| item.id() == id) {
        Some(item) => {
            item.set_column(column);
            true
        }
        None => false,
    }
}

/// True if both sequences carry the same `(id, column)` pairs in the same order
pub(crate) fn same_layout<T: BoardItem>(current: &[T], external: &[T]) -> bool {
    current.len() == external.len()
        && current
            .iter()
            .zip(external)
            .all(|(a, b)| a.id() == b.id() && a.column() == b.column())
}
