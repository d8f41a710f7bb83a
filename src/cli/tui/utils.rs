//! Shared utilities for TUI views

use chrono::NaiveDate;

use crate::board::TaskCard;
use crate::domain::TaskStatus;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncate_at = max_len.saturating_sub(3);
        let truncated: String = s.chars().take(truncate_at).collect();
        format!("{}...", truncated)
    }
}

/// True if the card is past due in the column it currently sits in
pub fn is_overdue(card: &TaskCard, today: NaiveDate) -> bool {
    !card.column.is_complete() && card.due_date.is_some_and(|due| due < today)
}

/// One list line for a card, fitted to `width` characters
pub fn card_line(card: &TaskCard, today: NaiveDate, width: usize) -> String {
    let marker = match card.column {
        TaskStatus::Todo => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Done => "[x]",
    };

    let mut suffix = String::new();
    if let Some(assignee) = &card.assignee {
        suffix.push_str(&format!(" @{}", assignee));
    }
    if is_overdue(card, today) {
        suffix.push_str(" !");
    }

    let room = width.saturating_sub(marker.len() + 1 + suffix.chars().count());
    format!("{} {}{}", marker, truncate_str(&card.name, room), suffix)
}
