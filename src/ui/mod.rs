//! Ratatui records browser: one tab per table, a row list, a detail pane, and
//! modal forms for creating, editing, and deleting rows.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
