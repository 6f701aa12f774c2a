//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use std::env;

use crate::domain::models::{CompressionActionKind, MoveStatus, TaskStatus};

/// Types that can be rendered as human-readable text or JSON.
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Print a command result in the selected mode.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum number of characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// First 8 characters of an id, for list display.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// A borderless list table with upper-case headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render a table under a count line.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{total} {noun}:\n{table}")
}

/// Key/value lines under a title.
pub fn detail(title: &str, fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut lines = vec![title.to_string()];
    for (key, value) in fields {
        lines.push(format!("  {:<width$}  {}", format!("{key}:"), value, width = width + 1));
    }
    lines.join("\n")
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM"), Ok(term) if term == "dumb")
}

fn colored(text: &str, color: Color) -> Cell {
    let cell = Cell::new(text);
    if supports_color() {
        cell.fg(color)
    } else {
        cell
    }
}

pub fn task_status_cell(status: TaskStatus) -> Cell {
    let color = match status {
        TaskStatus::Scheduled => Color::White,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Overdue => Color::Red,
        TaskStatus::Abandoned => Color::DarkGrey,
        TaskStatus::Compressed => Color::Cyan,
    };
    colored(status.as_str(), color)
}

pub fn move_status_cell(status: MoveStatus) -> Cell {
    let color = match status {
        MoveStatus::Active => Color::Yellow,
        MoveStatus::Aborted => Color::Red,
        MoveStatus::Completed => Color::Green,
    };
    colored(status.as_str(), color)
}

pub fn action_cell(action: CompressionActionKind) -> Cell {
    let color = match action {
        CompressionActionKind::Compressed => Color::Cyan,
        CompressionActionKind::FailedCompression => Color::Yellow,
        CompressionActionKind::Abandoned => Color::DarkGrey,
        CompressionActionKind::Aborted => Color::Red,
    };
    colored(action.as_str(), color)
}
