use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::db::{Record, Table};

/// Text shown in a form field or detail row for a stored value.
pub(crate) fn value_to_input(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Column/value lines for the detail pane, in the table's column order.
/// Columns the row does not carry are listed as blank.
pub(crate) fn record_lines(table: Table, record: &Record) -> Vec<Line<'static>> {
    table
        .columns()
        .iter()
        .map(|column| {
            let value = record.get(column.name).map(value_to_input).unwrap_or_default();
            let shown = if column.name == "password" && !value.is_empty() {
                "*".repeat(value.chars().count())
            } else {
                value
            };
            Line::from(vec![
                Span::styled(
                    format!("{:<20}", column.name),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(shown),
            ])
        })
        .collect()
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_renders_blank() {
        assert_eq!(value_to_input(&Value::Null), "");
        assert_eq!(value_to_input(&json!("x")), "x");
        assert_eq!(value_to_input(&json!(3)), "3");
    }

    #[test]
    fn password_is_masked_in_detail() {
        let Value::Object(row) = json!({"student_id": 1, "password": "secret"}) else {
            unreachable!()
        };
        let lines = record_lines(Table::Student, &row);
        assert_eq!(lines.len(), Table::Student.columns().len());
        let password = lines.last().unwrap().to_string();
        assert!(password.contains("******"));
        assert!(!password.contains("secret"));
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to save");
        assert_eq!(surface_error(&err), "disk full");
    }
}
