use anyhow::{anyhow, Result};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::db::{ColumnType, Record, Table};

use super::helpers::value_to_input;

/// Whether the form creates a row or rewrites an existing one.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FormPurpose {
    Create,
    Edit { key: Value },
}

#[derive(Debug, Clone)]
pub(crate) struct FormField {
    pub(crate) name: &'static str,
    pub(crate) kind: ColumnType,
    pub(crate) input: String,
}

/// Editable copy of one row. Every column of the table gets a field; on edit
/// the primary key is shown but locked.
#[derive(Debug, Clone)]
pub(crate) struct RecordForm {
    pub(crate) table: Table,
    pub(crate) purpose: FormPurpose,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl RecordForm {
    pub(crate) fn blank(table: Table) -> Self {
        let fields = table
            .columns()
            .iter()
            .map(|column| FormField {
                name: column.name,
                kind: column.kind,
                input: String::new(),
            })
            .collect();
        Self {
            table,
            purpose: FormPurpose::Create,
            fields,
            active: 0,
            error: None,
        }
    }

    /// Populate the form from a fetched row.
    pub(crate) fn from_record(table: Table, record: &Record) -> Result<Self> {
        let key = record
            .get(table.primary_key())
            .cloned()
            .ok_or_else(|| anyhow!("row has no {} value", table.primary_key()))?;
        let mut form = Self::blank(table);
        for field in &mut form.fields {
            field.input = record.get(field.name).map(value_to_input).unwrap_or_default();
        }
        form.purpose = FormPurpose::Edit { key };
        // Skip the locked key field.
        form.active = 1.min(form.fields.len().saturating_sub(1));
        Ok(form)
    }

    pub(crate) fn title(&self) -> String {
        match &self.purpose {
            FormPurpose::Create => format!("New {}", self.table.title()),
            FormPurpose::Edit { key } => {
                format!("Edit {} #{}", self.table.title(), value_to_input(key))
            }
        }
    }

    fn is_locked(&self, idx: usize) -> bool {
        matches!(self.purpose, FormPurpose::Edit { .. }) && idx == 0
    }

    pub(crate) fn next_field(&mut self) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        loop {
            self.active = (self.active + 1) % len;
            if !self.is_locked(self.active) {
                break;
            }
        }
    }

    pub(crate) fn previous_field(&mut self) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        loop {
            self.active = (self.active + len - 1) % len;
            if !self.is_locked(self.active) {
                break;
            }
        }
    }

    /// Append a character to the active field. Integer columns only take
    /// digits (and a leading minus sign).
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if self.is_locked(self.active) {
            return false;
        }
        let Some(field) = self.fields.get_mut(self.active) else {
            return false;
        };
        let accepted = match field.kind {
            ColumnType::Integer => ch.is_ascii_digit() || (ch == '-' && field.input.is_empty()),
            ColumnType::Text | ColumnType::Date | ColumnType::Time => !ch.is_control(),
        };
        if accepted {
            field.input.push(ch);
            self.error = None;
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        if self.is_locked(self.active) {
            return;
        }
        if let Some(field) = self.fields.get_mut(self.active) {
            field.input.pop();
        }
    }

    /// Build the values to send. Creating skips blank fields so the engine
    /// can assign the key (and reject missing required columns); editing
    /// writes every field except the key.
    pub(crate) fn to_record(&self) -> Result<Record> {
        let mut record = Record::new();
        for (idx, field) in self.fields.iter().enumerate() {
            let raw = field.input.trim();
            match self.purpose {
                FormPurpose::Create if raw.is_empty() => continue,
                FormPurpose::Edit { .. } if self.is_locked(idx) => continue,
                _ => {}
            }
            let value = match field.kind {
                ColumnType::Integer => raw
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| anyhow!("{} must be a whole number", field.name))?,
                ColumnType::Text | ColumnType::Date | ColumnType::Time => {
                    Value::String(raw.to_string())
                }
            };
            record.insert(field.name.to_string(), value);
        }
        if record.is_empty() {
            return Err(anyhow!("Fill in at least one field."));
        }
        Ok(record)
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = self
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let label_style = if idx == self.active {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else if self.is_locked(idx) {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                let cursor = if idx == self.active { "_" } else { "" };
                Line::from(vec![
                    Span::styled(format!("{:<20}", field.name), label_style),
                    Span::raw(format!("{}{}", field.input, cursor)),
                ])
            })
            .collect();

        if let Some(error) = &self.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        lines
    }
}

/// Pending delete awaiting a yes/no answer.
#[derive(Debug, Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) table: Table,
    pub(crate) key: Value,
    pub(crate) label: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_skips_blank_fields() {
        let mut form = RecordForm::blank(Table::Department);
        form.next_field();
        for ch in "Chemistry".chars() {
            assert!(form.push_char(ch));
        }
        let record = form.to_record().unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record["department_name"], json!("Chemistry"));
    }

    #[test]
    fn integer_fields_reject_letters() {
        let mut form = RecordForm::blank(Table::Enrollment);
        assert!(!form.push_char('x'));
        assert!(form.push_char('-'));
        assert!(form.push_char('4'));
        assert!(!form.push_char('-'));
        assert_eq!(form.fields[0].input, "-4");
    }

    #[test]
    fn edit_locks_key_and_parses_integers() {
        let Value::Object(row) = json!({
            "enrollment_id": 5, "student_id": 1, "course_id": 2, "grade": "C"
        }) else {
            unreachable!()
        };
        let mut form = RecordForm::from_record(Table::Enrollment, &row).unwrap();
        assert_eq!(form.active, 1);
        assert_eq!(form.title(), "Edit Enrollments #5");

        form.previous_field();
        assert_eq!(form.active, 3, "key field is skipped");

        form.backspace();
        assert!(form.push_char('B'));
        let record = form.to_record().unwrap();
        assert!(!record.contains_key("enrollment_id"));
        assert_eq!(record["student_id"], json!(1));
        assert_eq!(record["course_id"], json!(2));
        assert_eq!(record["grade"], json!("B"));
    }

    #[test]
    fn empty_create_is_rejected() {
        let form = RecordForm::blank(Table::Course);
        assert!(form.to_record().is_err());
    }
}
