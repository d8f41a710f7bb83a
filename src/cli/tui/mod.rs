//! Interactive kanban board
//!
//! A terminal drag surface over the task board: pick up a card, carry it to
//! another column and drop it. Moves confirm in the background; the view
//! shows the optimistic state straight away.

mod app;
mod event;
mod ui;
mod utils;
mod views;

use std::panic::{self, AssertUnwindSafe};

use anyhow::{anyhow, Result};
use tokio::runtime::Handle;
use tracing::info;

use crate::storage::Project;
use app::App;
use event::EventHandler;

/// Launch the TUI
pub fn run(project: Project, runtime: Handle) -> Result<()> {
    let tick_rate_ms = project.config().project.board.tick_rate_ms;
    info!(root = %project.root().display(), "opening interactive board");

    // Load data before touching the terminal
    let mut app = App::new(project, runtime)?;

    let mut terminal = ui::init_terminal()?;
    let event_handler = EventHandler::new(tick_rate_ms);

    // Run the main loop with panic safety
    // This ensures terminal is restored even if the app panics
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        app.run(&mut terminal, event_handler)
    }));

    // Always restore terminal, even on panic
    let restore_result = ui::restore_terminal();

    match result {
        Ok(inner_result) => {
            restore_result?;
            inner_result
        }
        Err(panic_payload) => {
            let _ = restore_result;
            if let Some(s) = panic_payload.downcast_ref::<&str>() {
                Err(anyhow!("TUI panicked: {}", s))
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                Err(anyhow!("TUI panicked: {}", s))
            } else {
                Err(anyhow!("TUI panicked with unknown error"))
            }
        }
    }
}
