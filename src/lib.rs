//! Core library surface for the Student Records application.
//!
//! `db` is the table access layer over the records database, `bridge` puts it
//! behind a worker thread and hands out async capability handles, and `ui` is
//! the terminal front-end that consumes those handles.
pub mod bridge;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

/// Persistence entry points most callers need.
pub use db::{Database, Lookup, QueryResult, Record, Table};

pub use bridge::{Bridge, Capabilities, DbGet, InsertUser, MyApi};
pub use config::Config;
pub use error::AccessError;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
