//! Terminal input and redraw ticks

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};

/// Terminal events
#[derive(Debug)]
pub enum Event {
    /// Key press
    Key(KeyEvent),
    /// Terminal resized; the next draw picks up the new size
    Resize,
    /// Nothing happened for one tick; redraw from the latest board snapshot
    Tick,
}

/// Reads terminal events on a background thread
pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    /// Starts the reader, ticking every `tick_rate_ms` when idle
    pub fn new(tick_rate_ms: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate_ms);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let event = match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
                    _ => continue,
                },
                _ => Event::Tick,
            };

            // Receiver gone: the board was closed
            if tx.send(event).is_err() {
                break;
            }
        });

        Self { rx }
    }

    /// Waits for the next event
    pub fn next(&self) -> Result<Event> {
        self.rx.recv().context("Terminal event reader stopped")
    }
}
