//! TUI application state and logic

use std::sync::mpsc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::event::{Event, EventHandler};
use super::ui::Terminal;
use super::views;
use crate::board::{DragEnd, DragStart, DropTarget, IgnoreReason, MoveOutcome, TaskBoard, TaskCard};
use crate::domain::TaskStatus;
use crate::storage::Project;

/// A card being carried across the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drag {
    pub id: String,
    /// Index into [`App::columns`] of the column under the card
    pub target: usize,
}

/// A drag-end that has finished confirming
struct Settled {
    id: String,
    outcome: MoveOutcome<TaskStatus>,
}

/// Application state
pub struct App {
    project: Project,
    board: TaskBoard,
    runtime: Handle,

    outcome_tx: mpsc::Sender<Settled>,
    outcome_rx: mpsc::Receiver<Settled>,

    /// Selected column, index into `columns()`
    column: usize,

    /// Selected card within the selected column
    card: usize,

    drag: Option<Drag>,
    show_completed: bool,
    status_message: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(project: Project, runtime: Handle) -> Result<Self> {
        let tasks = project.task_store().list()?;
        let board = TaskBoard::new(&tasks, project.status_service());
        let show_completed = project.config().project.board.show_done;
        let (outcome_tx, outcome_rx) = mpsc::channel();

        Ok(Self {
            project,
            board,
            runtime,
            outcome_tx,
            outcome_rx,
            column: 0,
            card: 0,
            drag: None,
            show_completed,
            status_message: None,
            should_quit: false,
        })
    }

    /// Run the main application loop
    pub fn run(&mut self, terminal: &mut Terminal, events: EventHandler) -> Result<()> {
        while !self.should_quit {
            self.settle_outcomes();

            terminal.draw(|frame| views::kanban::draw(frame, self))?;

            match events.next()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize | Event::Tick => {}
            }
        }

        Ok(())
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }

    /// Columns currently on screen, in board order
    pub fn columns(&self) -> Vec<TaskStatus> {
        TaskStatus::ALL
            .into_iter()
            .filter(|status| self.show_completed || !status.is_complete())
            .collect()
    }

    pub fn column_index(&self) -> usize {
        self.column
    }

    pub fn card_index(&self) -> usize {
        self.card
    }

    pub fn drag(&self) -> Option<&Drag> {
        self.drag.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    fn selected_status(&self) -> TaskStatus {
        let columns = self.columns();
        columns[self.column.min(columns.len() - 1)]
    }

    fn selected_card(&self) -> Option<TaskCard> {
        self.board
            .column(self.selected_status())
            .into_iter()
            .nth(self.card)
    }

    /// Keeps the selection inside the board after it changes
    fn clamp_selection(&mut self) {
        let columns = self.columns().len();
        self.column = self.column.min(columns - 1);
        let cards = self.board.column(self.selected_status()).len();
        self.card = self.card.min(cards.saturating_sub(1));
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.drag.is_some() {
            self.handle_drag_key(key);
        } else {
            self.handle_normal_key(key);
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }

            KeyCode::Char('h') | KeyCode::Left => {
                self.column = self.column.saturating_sub(1);
                self.clamp_selection();
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.column += 1;
                self.clamp_selection();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.card += 1;
                self.clamp_selection();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.card = self.card.saturating_sub(1);
            }

            KeyCode::Char(' ') | KeyCode::Enter => self.pick_up(),

            KeyCode::Char('c') => {
                self.show_completed = !self.show_completed;
                self.clamp_selection();
            }
            KeyCode::Char('r') => {
                self.refresh();
                self.status_message = Some("Refreshed".to_string());
            }

            KeyCode::Char('?') => {
                self.status_message = Some(
                    "h/l:column j/k:card space:pick up c:completed r:refresh q:quit".to_string(),
                );
            }

            _ => {}
        }
    }

    fn handle_drag_key(&mut self, key: KeyEvent) {
        let last = self.columns().len() - 1;
        let Some(drag) = self.drag.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Char('h') | KeyCode::Left => {
                drag.target = drag.target.saturating_sub(1);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                drag.target = (drag.target + 1).min(last);
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.drop_card(),
            KeyCode::Esc => self.cancel_drag(),
            _ => {}
        }
    }

    /// Starts dragging the selected card
    fn pick_up(&mut self) {
        let Some(card) = self.selected_card() else {
            self.status_message = Some("No card selected".to_string());
            return;
        };

        self.board.on_drag_start(&DragStart::new(card.id.clone()));
        self.status_message = None;
        self.drag = Some(Drag {
            id: card.id,
            target: self.column,
        });
    }

    /// Releases the card over the target column
    fn drop_card(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };

        let status = self.columns()[drag.target];
        self.end_drag(DragEnd::over(drag.id, DropTarget::new(status.as_str())));
        self.column = drag.target;
        self.clamp_selection();
    }

    fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.end_drag(DragEnd::cancelled(drag.id));
        }
    }

    /// Confirms the drag on the runtime; the outcome comes back through the
    /// channel and is picked up on a later loop iteration.
    fn end_drag(&self, event: DragEnd) {
        let board = self.board.clone();
        let tx = self.outcome_tx.clone();
        let id = event.active_id.clone();

        self.runtime.spawn(async move {
            let outcome = board.on_drag_end(event).await;
            // The app may have quit before the move settled
            let _ = tx.send(Settled { id, outcome });
        });
    }

    /// Shows finished moves and reloads the board from the store
    fn settle_outcomes(&mut self) {
        let mut settled = false;

        while let Ok(Settled { id, outcome }) = self.outcome_rx.try_recv() {
            settled = true;
            let name = self
                .board
                .engine()
                .item(&id)
                .map(|card| card.name)
                .unwrap_or_else(|| id.clone());

            self.status_message = Some(match outcome {
                MoveOutcome::Committed { from, to } => {
                    format!("Moved {}: {} -> {}", name, from.label(), to.label())
                }
                MoveOutcome::RolledBack { from, error, .. } => {
                    format!("Move of {} failed, back in {}: {}", name, from.label(), error)
                }
                MoveOutcome::Ignored(IgnoreReason::NoTarget) => {
                    "Drag cancelled".to_string()
                }
                MoveOutcome::Ignored(reason) => format!("Nothing moved: {}", reason),
            });
        }

        if settled {
            self.refresh();
        }
    }

    /// Reconciles the board with the task store
    fn refresh(&mut self) {
        match self.project.task_store().list() {
            Ok(tasks) => {
                if self.board.sync(&tasks) {
                    debug!(tasks = tasks.len(), "board refreshed from store");
                }
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "refresh failed");
                self.status_message = Some(format!("Refresh failed: {e:#}"));
            }
        }
        self.clamp_selection();
    }
}
