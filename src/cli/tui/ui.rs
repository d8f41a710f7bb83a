//! Terminal setup and teardown

use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Switches to raw mode on the alternate screen
pub fn init_terminal() -> Result<Terminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)
        .context("Failed to enter alternate screen")?;
    ratatui::Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

/// Puts the terminal back the way the shell expects it
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
        .context("Failed to leave alternate screen")?;
    Ok(())
}
