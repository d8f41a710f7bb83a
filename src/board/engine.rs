//! Board state engine
//!
//! Owns the board, reconciles it with the externally supplied items and runs
//! the drag protocol: record the origin on drag-start, resolve the target on
//! drag-end, apply the move optimistically, await the move handler, then
//! commit or roll back.
//!
//! The engine is a cheap cloneable handle. All clones share one board, so a
//! UI can keep reading snapshots while a move is confirming elsewhere. The
//! lock is never held across the confirmation await.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::drag::{DragEnd, DragOrigin, DragStart, DropTarget, IgnoreReason, MoveOutcome, MoveRequest};
use super::item::{same_layout, set_column_by_id, BoardItem, ColumnResolver};
use super::transaction::{MovePhase, OptimisticMove};

/// Confirms a move with whatever owns the real data.
///
/// An `Err` is the only failure signal the engine reacts to: it rolls the
/// optimistic update back and logs the error.
#[async_trait]
pub trait MoveHandler<T: BoardItem>: Send + Sync {
    async fn move_item(&self, request: MoveRequest<T>) -> anyhow::Result<()>;
}

/// Adapts an async closure into a [`MoveHandler`]
pub struct MoveFn<F>(F);

/// Wraps `f` so it can be passed as a move handler
pub fn move_fn<F>(f: F) -> MoveFn<F> {
    MoveFn(f)
}

#[async_trait]
impl<T, F, Fut> MoveHandler<T> for MoveFn<F>
where
    T: BoardItem,
    F: Fn(MoveRequest<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn move_item(&self, request: MoveRequest<T>) -> anyhow::Result<()> {
        (self.0)(request).await
    }
}

struct EngineState<T: BoardItem> {
    items: Arc<Vec<T>>,
    origin: Option<DragOrigin<T::Column>>,
    /// Items whose move is awaiting confirmation
    confirming: HashSet<String>,
}

/// Shared board with optimistic, confirmable moves
pub struct BoardEngine<T: BoardItem> {
    state: Arc<Mutex<EngineState<T>>>,
    columns: ColumnResolver<T::Column>,
    mover: Arc<dyn MoveHandler<T>>,
}

impl<T: BoardItem> Clone for BoardEngine<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            columns: Arc::clone(&self.columns),
            mover: Arc::clone(&self.mover),
        }
    }
}

impl<T: BoardItem> BoardEngine<T> {
    /// Creates an engine over `items`, using `columns` to recognise column
    /// identifiers and `mover` to confirm moves.
    pub fn new<M>(items: Vec<T>, columns: ColumnResolver<T::Column>, mover: M) -> Self
    where
        M: MoveHandler<T> + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                items: Arc::new(items),
                origin: None,
                confirming: HashSet::new(),
            })),
            columns,
            mover: Arc::new(mover),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current board snapshot. The `Arc` changes identity exactly when the
    /// board changes, so callers can skip redraws with `Arc::ptr_eq`.
    pub fn items(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.lock().items)
    }

    /// Looks up one item on the current board
    pub fn item(&self, id: &str) -> Option<T> {
        self.lock().items.iter().find(|item| item.id() == id).cloned()
    }

    /// True while a move of `id` is awaiting confirmation
    pub fn is_confirming(&self, id: &str) -> bool {
        self.lock().confirming.contains(id)
    }

    /// Id of the item whose drag origin is currently recorded
    pub fn dragging(&self) -> Option<String> {
        self.lock().origin.as_ref().map(|origin| origin.id.clone())
    }

    /// Replaces the board with `external` if it differs by `(id, column)`
    /// position by position. Returns true if the board was replaced.
    pub fn reconcile(&self, external: Vec<T>) -> bool {
        let mut state = self.lock();
        if same_layout(&state.items, &external) {
            return false;
        }

        debug!(
            previous = state.items.len(),
            next = external.len(),
            "board replaced from external items"
        );
        state.items = Arc::new(external);
        true
    }

    /// Records which column `event.active_id` is leaving
    pub fn on_drag_start(&self, event: &DragStart) {
        let mut state = self.lock();

        if state.confirming.contains(&event.active_id) {
            debug!(item_id = %event.active_id, "drag ignored: previous move still confirming");
            state.origin = None;
            return;
        }

        state.origin = state
            .items
            .iter()
            .find(|item| item.id() == event.active_id)
            .map(|item| DragOrigin {
                id: event.active_id.clone(),
                from: item.column(),
            });
    }

    /// Maps a drop target to a column.
    ///
    /// Tries the target id as a column, then the container hint, then the
    /// column of the item the target names, then `fallback`.
    pub fn resolve_target_column(
        &self,
        over: &DropTarget,
        fallback: Option<T::Column>,
    ) -> Option<T::Column> {
        let state = self.lock();
        self.resolve_in(&state.items, over, fallback)
    }

    fn resolve_in(
        &self,
        items: &[T],
        over: &DropTarget,
        fallback: Option<T::Column>,
    ) -> Option<T::Column> {
        (self.columns)(&over.id)
            .or_else(|| over.container_id.as_deref().and_then(|id| (self.columns)(id)))
            .or_else(|| {
                items
                    .iter()
                    .find(|item| item.id() == over.id)
                    .map(BoardItem::column)
            })
            .or(fallback)
    }

    /// Finishes a drag: resolves the target, applies the move, confirms it
    /// and rolls back on failure. Failures are logged, never returned as
    /// errors.
    ///
    /// If the returned future is dropped before the handler answers, the
    /// move is rolled back and the item can be dragged again.
    pub async fn on_drag_end(&self, event: DragEnd) -> MoveOutcome<T::Column> {
        let (request, pending) = match self.begin_move(&event) {
            Ok(started) => started,
            Err(reason) => {
                debug!(item_id = %event.active_id, %reason, "drop ignored");
                return MoveOutcome::Ignored(reason);
            }
        };

        let confirmation = Confirmation::new(self, &request, pending);
        let result = self.mover.move_item(request).await;
        confirmation.settle(result)
    }

    /// Synchronous part of drag-end, up to and including the optimistic apply
    fn begin_move(
        &self,
        event: &DragEnd,
    ) -> Result<(MoveRequest<T>, OptimisticMove<T>), IgnoreReason> {
        let mut state = self.lock();
        let origin = state.origin.take();

        let over = event.over.as_ref().ok_or(IgnoreReason::NoTarget)?;

        let item = state
            .items
            .iter()
            .find(|item| item.id() == event.active_id)
            .cloned()
            .ok_or(IgnoreReason::UnknownItem)?;

        let from = match origin {
            Some(origin) if origin.id == event.active_id => origin.from,
            _ => item.column(),
        };

        let to = self
            .resolve_in(&state.items, over, None)
            .ok_or(IgnoreReason::Unresolved)?;

        if from == to {
            return Err(IgnoreReason::SameColumn);
        }

        if state.confirming.contains(&event.active_id) {
            return Err(IgnoreReason::InFlight);
        }

        let mut pending = OptimisticMove::new(event.active_id.clone());
        if !pending.apply(&mut state.items, from, to) {
            return Err(IgnoreReason::UnknownItem);
        }
        state.confirming.insert(event.active_id.clone());

        Ok((MoveRequest { item, from, to }, pending))
    }

    /// Sets an item's column immediately, with no confirmation and no
    /// rollback. Returns false if the item is not on the board.
    pub fn move_optimistic(&self, id: &str, to: T::Column) -> bool {
        let mut state = self.lock();
        let mut next = Vec::clone(&state.items);
        if !set_column_by_id(&mut next, id, to) {
            return false;
        }
        state.items = Arc::new(next);
        true
    }
}

/// A move awaiting its handler.
///
/// Owns the item's `confirming` entry and the compensation. Dropping it
/// unsettled (the drag-end future was aborted or the handler panicked) rolls
/// the move back and releases the item.
struct Confirmation<'a, T: BoardItem> {
    engine: &'a BoardEngine<T>,
    id: String,
    from: T::Column,
    to: T::Column,
    pending: OptimisticMove<T>,
}

impl<'a, T: BoardItem> Confirmation<'a, T> {
    fn new(
        engine: &'a BoardEngine<T>,
        request: &MoveRequest<T>,
        mut pending: OptimisticMove<T>,
    ) -> Self {
        pending.begin_confirm();
        Self {
            engine,
            id: request.item.id().to_string(),
            from: request.from,
            to: request.to,
            pending,
        }
    }

    fn settle(mut self, result: anyhow::Result<()>) -> MoveOutcome<T::Column> {
        let (id, from, to) = (self.id.clone(), self.from, self.to);
        let mut state = self.engine.lock();
        state.confirming.remove(&id);

        match result {
            Ok(()) => {
                self.pending.commit();
                info!(item_id = %id, %from, %to, phase = ?self.pending.phase(), "move committed");
                MoveOutcome::Committed { from, to }
            }
            Err(e) => {
                let message = format!("{e:#}");
                let restored = self.pending.roll_back(&mut state.items);
                error!(
                    item_id = %id,
                    %from,
                    %to,
                    restored,
                    phase = ?self.pending.phase(),
                    error = %message,
                    "move rejected, rolled back"
                );
                MoveOutcome::RolledBack {
                    from,
                    to,
                    error: message,
                }
            }
        }
    }
}

impl<T: BoardItem> Drop for Confirmation<'_, T> {
    fn drop(&mut self) {
        if self.pending.phase() != MovePhase::Confirming {
            return;
        }

        let mut state = self.engine.lock();
        state.confirming.remove(&self.id);
        let restored = self.pending.roll_back(&mut state.items);
        warn!(
            item_id = %self.id,
            from = %self.from,
            to = %self.to,
            restored,
            "move abandoned before confirmation, rolled back"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::item::column_resolver;
    use proptest::prelude::*;
    use std::fmt;
    use tokio::sync::oneshot;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Lane {
        A,
        B,
        C,
    }

    impl fmt::Display for Lane {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn lane(s: &str) -> Option<Lane> {
        match s {
            "A" => Some(Lane::A),
            "B" => Some(Lane::B),
            "C" => Some(Lane::C),
            _ => None,
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Card {
        id: String,
        column: Lane,
    }

    impl BoardItem for Card {
        type Column = Lane;

        fn id(&self) -> &str {
            &self.id
        }

        fn column(&self) -> Lane {
            self.column
        }

        fn set_column(&mut self, column: Lane) {
            self.column = column;
        }
    }

    fn cards(layout: &[(&str, Lane)]) -> Vec<Card> {
        layout
            .iter()
            .map(|(id, column)| Card {
                id: id.to_string(),
                column: *column,
            })
            .collect()
    }

    fn layout(items: &[Card]) -> Vec<(String, Lane)> {
        items.iter().map(|c| (c.id.clone(), c.column)).collect()
    }

    /// Records every request and answers with a fixed result
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<(String, Lane, Lane)>>>,
        fail: bool,
    }

    impl Recorder {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, Lane, Lane)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MoveHandler<Card> for Recorder {
        async fn move_item(&self, request: MoveRequest<Card>) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((request.item.id.clone(), request.from, request.to));
            if self.fail {
                anyhow::bail!("server said no");
            }
            Ok(())
        }
    }

    fn scenario(recorder: Recorder) -> BoardEngine<Card> {
        BoardEngine::new(
            cards(&[("1", Lane::A), ("2", Lane::B), ("3", Lane::C)]),
            column_resolver(lane),
            recorder,
        )
    }

    #[tokio::test]
    async fn drop_over_item_in_container_commits() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());

        engine.on_drag_start(&DragStart::new("1"));
        let outcome = engine
            .on_drag_end(DragEnd::over("1", DropTarget::in_container("2", "B")))
            .await;

        assert_eq!(outcome, MoveOutcome::Committed { from: Lane::A, to: Lane::B });
        assert_eq!(engine.item("1").unwrap().column, Lane::B);
        assert_eq!(recorder.calls(), vec![("1".to_string(), Lane::A, Lane::B)]);
    }

    #[tokio::test]
    async fn rejected_move_rolls_back() {
        let recorder = Recorder::failing();
        let engine = scenario(recorder.clone());

        engine.on_drag_start(&DragStart::new("1"));
        let outcome = engine
            .on_drag_end(DragEnd::over("1", DropTarget::in_container("2", "B")))
            .await;

        assert!(outcome.is_rolled_back());
        assert_eq!(
            layout(&engine.items()),
            layout(&cards(&[("1", Lane::A), ("2", Lane::B), ("3", Lane::C)]))
        );
        assert_eq!(recorder.calls().len(), 1);
    }

    #[tokio::test]
    async fn rejected_move_logs_error() {
        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl<'a> MakeWriter<'a> for Captured {
            type Writer = Captured;

            fn make_writer(&'a self) -> Self::Writer {
                self.clone()
            }
        }

        let logs = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let engine = scenario(Recorder::failing());
        engine.on_drag_start(&DragStart::new("1"));
        engine
            .on_drag_end(DragEnd::over("1", DropTarget::new("C")))
            .await;

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("ERROR"));
        assert!(text.contains("rolled back"));
        assert!(text.contains("server said no"));
    }

    #[tokio::test]
    async fn no_target_is_a_no_op() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());
        let before = engine.items();

        engine.on_drag_start(&DragStart::new("1"));
        let outcome = engine.on_drag_end(DragEnd::cancelled("1")).await;

        assert_eq!(outcome, MoveOutcome::Ignored(IgnoreReason::NoTarget));
        assert!(Arc::ptr_eq(&before, &engine.items()));
        assert!(recorder.calls().is_empty());
        assert_eq!(engine.dragging(), None);
    }

    #[tokio::test]
    async fn same_column_drop_is_a_no_op() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());
        let before = engine.items();

        engine.on_drag_start(&DragStart::new("2"));
        let outcome = engine
            .on_drag_end(DragEnd::over("2", DropTarget::new("B")))
            .await;

        assert_eq!(outcome, MoveOutcome::Ignored(IgnoreReason::SameColumn));
        assert!(Arc::ptr_eq(&before, &engine.items()));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn unresolved_target_is_a_no_op() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());

        engine.on_drag_start(&DragStart::new("1"));
        let outcome = engine
            .on_drag_end(DragEnd::over("1", DropTarget::new("nowhere")))
            .await;

        assert_eq!(outcome.ignored_reason(), Some(IgnoreReason::Unresolved));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_item_is_a_no_op() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());

        let outcome = engine
            .on_drag_end(DragEnd::over("42", DropTarget::new("B")))
            .await;

        assert_eq!(outcome.ignored_reason(), Some(IgnoreReason::UnknownItem));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn drag_without_start_uses_current_column() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());

        let outcome = engine
            .on_drag_end(DragEnd::over("3", DropTarget::new("A")))
            .await;

        assert_eq!(outcome, MoveOutcome::Committed { from: Lane::C, to: Lane::A });
        assert_eq!(recorder.calls(), vec![("3".to_string(), Lane::C, Lane::A)]);
    }

    #[tokio::test]
    async fn origin_for_other_item_is_not_used() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());

        engine.on_drag_start(&DragStart::new("1"));
        engine.on_drag_end(DragEnd::over("2", DropTarget::new("C"))).await;

        assert_eq!(recorder.calls(), vec![("2".to_string(), Lane::B, Lane::C)]);
        // Origin was consumed by the mismatched drag-end
        assert_eq!(engine.dragging(), None);
    }

    #[tokio::test]
    async fn origin_is_captured_at_drag_start() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());

        engine.on_drag_start(&DragStart::new("1"));
        // A programmatic move lands mid-drag
        engine.move_optimistic("1", Lane::C);
        engine.on_drag_end(DragEnd::over("1", DropTarget::new("B"))).await;

        assert_eq!(recorder.calls(), vec![("1".to_string(), Lane::A, Lane::B)]);
    }

    #[test]
    fn drag_start_on_missing_item_clears_origin() {
        let engine = scenario(Recorder::default());

        engine.on_drag_start(&DragStart::new("1"));
        assert_eq!(engine.dragging().as_deref(), Some("1"));

        engine.on_drag_start(&DragStart::new("missing"));
        assert_eq!(engine.dragging(), None);
    }

    #[test]
    fn resolve_precedence() {
        let engine = scenario(Recorder::default());

        // Column id wins over container hint
        assert_eq!(
            engine.resolve_target_column(&DropTarget::in_container("C", "A"), None),
            Some(Lane::C)
        );
        // Container hint wins over the item's own column
        assert_eq!(
            engine.resolve_target_column(&DropTarget::in_container("2", "A"), None),
            Some(Lane::A)
        );
        // Item column
        assert_eq!(
            engine.resolve_target_column(&DropTarget::new("3"), None),
            Some(Lane::C)
        );
        // Invalid container hint falls through to the item
        assert_eq!(
            engine.resolve_target_column(&DropTarget::in_container("2", "zzz"), None),
            Some(Lane::B)
        );
        // Fallback, then unresolved
        assert_eq!(
            engine.resolve_target_column(&DropTarget::new("?"), Some(Lane::A)),
            Some(Lane::A)
        );
        assert_eq!(engine.resolve_target_column(&DropTarget::new("?"), None), None);
    }

    #[test]
    fn move_optimistic_is_synchronous() {
        let recorder = Recorder::default();
        let engine = scenario(recorder.clone());

        assert!(engine.move_optimistic("2", Lane::A));
        assert_eq!(engine.item("2").unwrap().column, Lane::A);
        assert!(recorder.calls().is_empty());

        assert!(!engine.move_optimistic("missing", Lane::A));
    }

    #[test]
    fn reconcile_keeps_reference_for_equal_layout() {
        let engine = scenario(Recorder::default());
        let before = engine.items();

        let replaced = engine.reconcile(cards(&[("1", Lane::A), ("2", Lane::B), ("3", Lane::C)]));

        assert!(!replaced);
        assert!(Arc::ptr_eq(&before, &engine.items()));
    }

    #[test]
    fn reconcile_replaces_on_column_change_or_reorder() {
        let engine = scenario(Recorder::default());

        assert!(engine.reconcile(cards(&[("1", Lane::B), ("2", Lane::B), ("3", Lane::C)])));
        assert_eq!(engine.item("1").unwrap().column, Lane::B);

        assert!(engine.reconcile(cards(&[("2", Lane::B), ("1", Lane::B), ("3", Lane::C)])));
        assert_eq!(engine.items()[0].id, "2");

        assert!(engine.reconcile(cards(&[("2", Lane::B)])));
        assert_eq!(engine.items().len(), 1);
    }

    /// Hands out one pending confirmation the test resolves by hand
    struct Gate {
        rx: Mutex<Option<oneshot::Receiver<anyhow::Result<()>>>>,
    }

    #[async_trait]
    impl MoveHandler<Card> for Gate {
        async fn move_item(&self, _request: MoveRequest<Card>) -> anyhow::Result<()> {
            let rx = self.rx.lock().unwrap().take();
            match rx {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(anyhow::anyhow!("gate dropped"))),
                None => Ok(()),
            }
        }
    }

    fn gated() -> (BoardEngine<Card>, oneshot::Sender<anyhow::Result<()>>) {
        let (tx, rx) = oneshot::channel();
        let engine = BoardEngine::new(
            cards(&[("1", Lane::A), ("2", Lane::B), ("3", Lane::C)]),
            column_resolver(lane),
            Gate {
                rx: Mutex::new(Some(rx)),
            },
        );
        (engine, tx)
    }

    async fn wait_until_confirming(engine: &BoardEngine<Card>, id: &str) {
        while !engine.is_confirming(id) {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn optimistic_state_visible_while_confirming() {
        let (engine, gate) = gated();
        let worker = engine.clone();

        let handle = tokio::spawn(async move {
            worker.on_drag_end(DragEnd::over("1", DropTarget::new("C"))).await
        });
        wait_until_confirming(&engine, "1").await;

        assert_eq!(engine.item("1").unwrap().column, Lane::C);

        gate.send(Err(anyhow::anyhow!("offline"))).unwrap();
        let outcome = handle.await.unwrap();

        assert!(outcome.is_rolled_back());
        assert_eq!(engine.item("1").unwrap().column, Lane::A);
        assert!(!engine.is_confirming("1"));
    }

    #[tokio::test]
    async fn second_drag_of_confirming_item_is_rejected() {
        let (engine, gate) = gated();
        let worker = engine.clone();

        let handle = tokio::spawn(async move {
            worker.on_drag_end(DragEnd::over("1", DropTarget::new("B"))).await
        });
        wait_until_confirming(&engine, "1").await;

        engine.on_drag_start(&DragStart::new("1"));
        assert_eq!(engine.dragging(), None);

        let second = engine
            .on_drag_end(DragEnd::over("1", DropTarget::new("C")))
            .await;
        assert_eq!(second.ignored_reason(), Some(IgnoreReason::InFlight));
        assert_eq!(engine.item("1").unwrap().column, Lane::B);

        // Other items are unaffected
        let other = engine
            .on_drag_end(DragEnd::over("3", DropTarget::new("A")))
            .await;
        assert!(other.is_committed());

        gate.send(Ok(())).unwrap();
        assert!(handle.await.unwrap().is_committed());
        assert_eq!(engine.item("1").unwrap().column, Lane::B);
    }

    #[tokio::test]
    async fn rollback_after_external_refresh_restores_origin_column() {
        let (engine, gate) = gated();
        let worker = engine.clone();

        let handle = tokio::spawn(async move {
            worker.on_drag_end(DragEnd::over("1", DropTarget::new("B"))).await
        });
        wait_until_confirming(&engine, "1").await;

        // A background refresh lands mid-confirmation with item 3 moved
        engine.reconcile(cards(&[("1", Lane::B), ("2", Lane::B), ("3", Lane::A)]));

        gate.send(Err(anyhow::anyhow!("conflict"))).unwrap();
        handle.await.unwrap();

        assert_eq!(
            layout(&engine.items()),
            layout(&cards(&[("1", Lane::A), ("2", Lane::B), ("3", Lane::A)]))
        );
    }

    #[tokio::test]
    async fn aborted_drag_end_rolls_back_and_frees_item() {
        let engine = BoardEngine::new(
            cards(&[("1", Lane::A), ("2", Lane::B)]),
            column_resolver(lane),
            move_fn(|_request: MoveRequest<Card>| {
                std::future::pending::<anyhow::Result<()>>()
            }),
        );
        let worker = engine.clone();

        let handle = tokio::spawn(async move {
            worker.on_drag_end(DragEnd::over("1", DropTarget::new("B"))).await
        });
        wait_until_confirming(&engine, "1").await;
        assert_eq!(engine.item("1").unwrap().column, Lane::B);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert!(!engine.is_confirming("1"));
        assert_eq!(engine.item("1").unwrap().column, Lane::A);
        engine.on_drag_start(&DragStart::new("1"));
        assert_eq!(engine.dragging().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn panicking_handler_rolls_back() {
        struct Crashes;

        #[async_trait]
        impl MoveHandler<Card> for Crashes {
            async fn move_item(&self, _request: MoveRequest<Card>) -> anyhow::Result<()> {
                panic!("handler crashed")
            }
        }

        let engine = BoardEngine::new(cards(&[("1", Lane::A)]), column_resolver(lane), Crashes);
        let worker = engine.clone();

        let result = tokio::spawn(async move {
            worker.on_drag_end(DragEnd::over("1", DropTarget::new("C"))).await
        })
        .await;

        assert!(result.unwrap_err().is_panic());
        assert!(!engine.is_confirming("1"));
        assert_eq!(engine.item("1").unwrap().column, Lane::A);
    }

    #[tokio::test]
    async fn settled_move_is_not_undone_by_a_later_drag() {
        let (engine, gate) = gated();
        let worker = engine.clone();

        let first = tokio::spawn(async move {
            worker.on_drag_end(DragEnd::over("1", DropTarget::new("B"))).await
        });
        wait_until_confirming(&engine, "1").await;
        gate.send(Ok(())).unwrap();
        assert!(first.await.unwrap().is_committed());

        // The gate is spent, so this one commits at once
        let second = engine
            .on_drag_end(DragEnd::over("1", DropTarget::new("C")))
            .await;
        assert!(second.is_committed());
        assert_eq!(engine.item("1").unwrap().column, Lane::C);
        assert!(!engine.is_confirming("1"));
    }

    #[tokio::test]
    async fn closure_move_handler() {
        let engine = BoardEngine::new(
            cards(&[("1", Lane::A)]),
            column_resolver(lane),
            move_fn(|request: MoveRequest<Card>| async move {
                if request.to == Lane::C {
                    anyhow::bail!("column C is frozen");
                }
                Ok(())
            }),
        );

        assert!(engine
            .on_drag_end(DragEnd::over("1", DropTarget::new("B")))
            .await
            .is_committed());
        assert!(engine
            .on_drag_end(DragEnd::over("1", DropTarget::new("C")))
            .await
            .is_rolled_back());
        assert_eq!(engine.item("1").unwrap().column, Lane::B);
    }

    fn lane_strategy() -> impl Strategy<Value = Lane> {
        prop_oneof![Just(Lane::A), Just(Lane::B), Just(Lane::C)]
    }

    fn indexed(columns: &[Lane]) -> Vec<Card> {
        columns
            .iter()
            .enumerate()
            .map(|(i, column)| Card {
                id: i.to_string(),
                column: *column,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn reconcile_with_equal_layout_keeps_reference(
            columns in proptest::collection::vec(lane_strategy(), 0..12)
        ) {
            let engine = BoardEngine::new(indexed(&columns), column_resolver(lane), Recorder::default());
            let before = engine.items();

            prop_assert!(!engine.reconcile(indexed(&columns)));
            prop_assert!(Arc::ptr_eq(&before, &engine.items()));
        }

        #[test]
        fn reconcile_always_converges_to_external(
            current in proptest::collection::vec(lane_strategy(), 0..12),
            external in proptest::collection::vec(lane_strategy(), 0..12),
        ) {
            let engine = BoardEngine::new(indexed(&current), column_resolver(lane), Recorder::default());

            let replaced = engine.reconcile(indexed(&external));

            prop_assert_eq!(replaced, current != external);
            prop_assert_eq!(layout(&engine.items()), layout(&indexed(&external)));
        }
    }
}
