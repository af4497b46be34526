use std::fs;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;

use super::schema::Table;

/// Owned handle on the records database. Opening it bootstraps the schema;
/// [`Database::close`] releases it and reports anything SQLite had to say.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Ensure the database file exists, create missing tables, and apply the
    /// configured foreign-key enforcement.
    pub fn open(config: &Config) -> Result<Self> {
        let conn = match &config.db_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                info!(path = %path.display(), "opening records database");
                Connection::open(path)?
            }
            None => {
                info!("opening in-memory records database");
                Connection::open_in_memory()?
            }
        };

        let database = Self { conn };
        database.set_foreign_keys(config.enforce_foreign_keys)?;
        database.ensure_schema()?;
        Ok(database)
    }

    /// Private in-memory database with the default settings. Everything in
    /// it is lost once the handle is closed.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&Config::in_memory())
    }

    /// Create every table that does not exist yet. Safe to run on each start.
    pub fn ensure_schema(&self) -> Result<()> {
        for table in Table::ALL {
            self.conn.execute(&table.create_sql(), [])?;
            debug!(table = table.name(), "table ready");
        }
        Ok(())
    }

    /// Turn foreign-key enforcement on or off for this connection.
    pub fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        let pragma = if enabled {
            "PRAGMA foreign_keys = ON"
        } else {
            "PRAGMA foreign_keys = OFF"
        };
        self.conn.execute(pragma, [])?;
        debug!(enabled, "foreign key enforcement set");
        Ok(())
    }

    /// Ask the engine whether foreign keys are currently enforced.
    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let enabled: i64 = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        Ok(enabled == 1)
    }

    /// Borrow the underlying connection for the table access functions.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, surfacing errors that dropping would swallow.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err)?;
        info!("records database closed");
        Ok(())
    }
}
