use std::future::Future;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use tokio::runtime::Runtime;

use crate::bridge::MyApi;
use crate::db::{QueryResult, Record, Table};
use crate::models::summarize;

use super::forms::{ConfirmDelete, FormPurpose, RecordForm};
use super::helpers::{centered_rect, record_lines, surface_error, value_to_input};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const TABS_HEIGHT: u16 = 3;

/// Fine-grained modes layered over the table view.
enum Mode {
    Normal,
    Editing(RecordForm),
    ConfirmDelete(ConfirmDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// State of the records browser. All database access goes through the
/// bridge's `MyApi` capability; the runtime drives the replies.
pub struct App {
    runtime: Runtime,
    api: MyApi,
    tab: usize,
    data: QueryResult,
    selected: usize,
    detail: Option<Record>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(runtime: Runtime, api: MyApi) -> Result<Self> {
        let mut app = Self {
            runtime,
            api,
            tab: 0,
            data: QueryResult {
                rows: Vec::new(),
                columns: Vec::new(),
            },
            selected: 0,
            detail: None,
            mode: Mode::Normal,
            status: None,
        };
        app.reload(None)?;
        Ok(app)
    }

    fn table(&self) -> Table {
        Table::ALL[self.tab]
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Editing(form) => self.handle_form_key(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Left | KeyCode::BackTab => self.switch_tab(-1)?,
            KeyCode::Right | KeyCode::Tab => self.switch_tab(1)?,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Enter => self.refresh_detail(),
            KeyCode::Char('r') => {
                let key = self.selected_key();
                self.reload(key)?;
                self.set_status("Reloaded.", StatusKind::Info);
            }
            KeyCode::Char('n') => {
                self.clear_status();
                return Ok(Mode::Editing(RecordForm::blank(self.table())));
            }
            KeyCode::Char('e') => match self.current_row() {
                Some(row) => match RecordForm::from_record(self.table(), row) {
                    Ok(form) => {
                        self.clear_status();
                        return Ok(Mode::Editing(form));
                    }
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                },
                None => self.set_status("No row selected.", StatusKind::Error),
            },
            KeyCode::Char('d') => match self.current_row() {
                Some(row) => {
                    let table = self.table();
                    if let Some(key) = row.get(table.primary_key()).cloned() {
                        let label = summarize(table, row);
                        return Ok(Mode::ConfirmDelete(ConfirmDelete { table, key, label }));
                    }
                    self.set_status("Row has no primary key.", StatusKind::Error);
                }
                None => self.set_status("No row selected.", StatusKind::Error),
            },
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_form_key(&mut self, code: KeyCode, mut form: RecordForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            KeyCode::Enter => match self.save_form(&form) {
                Ok(message) => {
                    self.set_status(message, StatusKind::Info);
                    return Mode::Normal;
                }
                Err(err) => form.error = Some(surface_error(&err)),
            },
            _ => {}
        }
        Mode::Editing(form)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.perform_delete(&confirm) {
                    Ok(()) => self.set_status(
                        format!("Deleted {}.", confirm.label),
                        StatusKind::Info,
                    ),
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Delete cancelled.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn save_form(&mut self, form: &RecordForm) -> Result<String> {
        let table = form.table;
        let values = form.to_record()?;
        match &form.purpose {
            FormPurpose::Create => {
                let id = self.block_on(self.api.insert_into_table(table, values))?;
                self.reload(Some(id.into()))?;
                Ok(format!("Added {} #{id}.", table.title()))
            }
            FormPurpose::Edit { key } => {
                let message = self.block_on(self.api.update_table_row(
                    table,
                    table.primary_key(),
                    key.clone(),
                    values,
                ))?;
                self.reload(Some(key.clone()))?;
                Ok(message)
            }
        }
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<()> {
        let table = confirm.table;
        self.block_on(self.api.delete_table_row(
            table,
            confirm.key.clone(),
            table.primary_key(),
        ))?;
        self.reload(None)
    }

    /// Re-query the active table, keeping the row with `focus` selected when
    /// it is still present.
    fn reload(&mut self, focus: Option<serde_json::Value>) -> Result<()> {
        let table = self.table();
        self.data = self.block_on(self.api.query_all(table))?;

        if let Some(focus) = focus {
            if let Some(idx) = self
                .data
                .rows
                .iter()
                .position(|row| row.get(table.primary_key()) == Some(&focus))
            {
                self.selected = idx;
            }
        }
        self.ensure_in_bounds();
        self.detail = self.current_row().cloned();
        Ok(())
    }

    /// Fetch the selected row again by key so the detail pane reflects the
    /// database rather than the cached list.
    fn refresh_detail(&mut self) {
        let table = self.table();
        let Some(key) = self.selected_key() else {
            self.set_status("No row selected.", StatusKind::Error);
            return;
        };
        match self.block_on(self.api.query_one(table, key)) {
            Ok(row) => {
                self.detail = Some(row);
                self.clear_status();
            }
            Err(err) => {
                self.detail = None;
                self.set_status(err.to_string(), StatusKind::Error);
            }
        }
    }

    fn switch_tab(&mut self, offset: isize) -> Result<()> {
        let count = Table::ALL.len() as isize;
        self.tab = (self.tab as isize + offset).rem_euclid(count) as usize;
        self.selected = 0;
        self.clear_status();
        self.reload(None)
    }

    fn move_selection(&mut self, offset: isize) {
        if self.data.rows.is_empty() {
            return;
        }
        let max = self.data.rows.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, max) as usize;
        self.detail = self.current_row().cloned();
    }

    fn ensure_in_bounds(&mut self) {
        if self.data.rows.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.data.rows.len() {
            self.selected = self.data.rows.len() - 1;
        }
    }

    fn current_row(&self) -> Option<&Record> {
        self.data.rows.get(self.selected)
    }

    fn selected_key(&self) -> Option<serde_json::Value> {
        self.current_row()
            .and_then(|row| row.get(self.table().primary_key()))
            .cloned()
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TABS_HEIGHT),
                Constraint::Min(3),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(frame.area());

        self.draw_tabs(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::Editing(form) => self.draw_form(frame, frame.area(), form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, frame.area(), confirm),
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles = Table::ALL.iter().map(|table| table.title()).collect::<Vec<_>>();
        let tabs = Tabs::new(titles)
            .select(self.tab)
            .block(Block::default().borders(Borders::ALL).title("Student Records"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_body(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let table = self.table();
        let items: Vec<ListItem> = self
            .data
            .rows
            .iter()
            .map(|row| {
                let key = row
                    .get(table.primary_key())
                    .map(value_to_input)
                    .unwrap_or_default();
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{key:>5} "), Style::default().fg(Color::DarkGray)),
                    Span::raw(summarize(table, row)),
                ]))
            })
            .collect();

        let list_title = format!("{} ({})", table.title(), self.data.rows.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(list_title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        if !self.data.rows.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, columns[0], &mut state);

        let detail_lines = match &self.detail {
            Some(row) => record_lines(table, row),
            None => vec![Line::from(Span::styled(
                "No row selected. Press n to add one.",
                Style::default().fg(Color::DarkGray),
            ))],
        };
        let detail = Paragraph::new(detail_lines)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: false });
        frame.render_widget(detail, columns[1]);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.status {
            Some(status) => Line::from(Span::styled(status.text.clone(), status.kind.style())),
            None => self.footer_instructions(),
        };
        let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, area);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let text = match self.mode {
            Mode::Normal => {
                "←/→ table  ↑/↓ row  Enter refresh  n new  e edit  d delete  r reload  q quit"
            }
            Mode::Editing(_) => "Tab/↑/↓ field  Enter save  Esc cancel",
            Mode::ConfirmDelete(_) => "y confirm  n cancel",
        };
        Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &RecordForm) {
        let popup = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup);
        let paragraph = Paragraph::new(form.lines())
            .block(Block::default().borders(Borders::ALL).title(form.title()))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, popup);
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup);
        let lines = vec![
            Line::from(format!("Delete {}?", confirm.label)),
            Line::from(""),
            Line::from(Span::styled(
                "y = delete, n = keep",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Delete from {}", confirm.table.title())),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup);
    }
}
