//! Kanban view: one column per status, drawn from the board snapshot

use chrono::Utc;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::board::TaskCard;
use crate::cli::tui::app::App;
use crate::cli::tui::utils::{card_line, is_overdue};
use crate::domain::TaskStatus;

fn column_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::Green,
        TaskStatus::InProgress => Color::Yellow,
        TaskStatus::Done => Color::DarkGray,
    }
}

/// Draw the kanban layout
pub fn draw(frame: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Columns
            Constraint::Length(3), // Status bar
        ])
        .split(frame.area());

    let statuses = app.columns();
    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            statuses
                .iter()
                .map(|_| Constraint::Ratio(1, statuses.len() as u32)),
        )
        .split(main_chunks[0]);

    // One snapshot per frame so all columns agree
    let snapshot = app.board().items();

    for (i, (status, area)) in statuses.iter().zip(areas.iter()).enumerate() {
        let cards: Vec<&TaskCard> = snapshot.iter().filter(|c| c.column == *status).collect();
        draw_column(frame, app, i, *status, &cards, *area);
    }

    draw_status_bar(frame, app, main_chunks[1]);
}

fn draw_column(
    frame: &mut Frame,
    app: &App,
    index: usize,
    status: TaskStatus,
    cards: &[&TaskCard],
    area: Rect,
) {
    let today = Utc::now().date_naive();
    let width = area.width.saturating_sub(2) as usize;
    let dragging = app.drag().map(|d| d.id.as_str());
    let is_target = app.drag().is_some_and(|d| d.target == index);
    let is_selected = app.drag().is_none() && app.column_index() == index;

    let items: Vec<ListItem> = cards
        .iter()
        .enumerate()
        .map(|(row, card)| {
            let mut style = Style::default().fg(column_color(card.column));
            if is_overdue(card, today) {
                style = style.fg(Color::Red);
            }
            if app.board().engine().is_confirming(&card.id) {
                style = style.add_modifier(Modifier::ITALIC | Modifier::DIM);
            }
            if dragging == Some(card.id.as_str()) {
                style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
            } else if is_selected && row == app.card_index() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(card_line(card, today, width)).style(style)
        })
        .collect();

    let (title, border) = if is_target {
        (
            format!("> {} ({}) <", status.label(), cards.len()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            format!("{} ({})", status.label(), cards.len()),
            Style::default().fg(column_color(status)),
        )
    };

    let list = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border),
    );

    frame.render_widget(list, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (content, style) = match app.drag() {
        Some(drag) => {
            let target = app.columns()[drag.target];
            (
                format!(
                    "Dragging {} to {}  [h/l]target [space]drop [Esc]cancel",
                    drag.id,
                    target.label()
                ),
                Style::default().fg(Color::Cyan),
            )
        }
        None => (
            app.status_message()
                .unwrap_or("[h/l]column [j/k]card [space]pick up [c]ompleted [r]efresh [q]uit")
                .to_string(),
            Style::default(),
        ),
    };

    let paragraph = Paragraph::new(format!("taskboard  {}", content))
        .style(style)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Task;
    use crate::storage::Project;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn rendered(app: &App) -> String {
        let mut terminal = ratatui::Terminal::new(TestBackend::new(90, 14)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn draws_columns_and_target() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        project.task_store().append(&Task::new("Write parser")).unwrap();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut app = App::new(project, runtime.handle().clone()).unwrap();

        let screen = rendered(&app);
        assert!(screen.contains("Todo (1)"));
        assert!(screen.contains("In Progress (0)"));
        assert!(screen.contains("Done (0)"));
        assert!(screen.contains("[ ] Write parser"));

        app.handle_key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::NONE));

        let screen = rendered(&app);
        assert!(screen.contains("> In Progress (0) <"));
        assert!(screen.contains("Dragging t-"));
    }
}
