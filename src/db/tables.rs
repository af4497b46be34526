//! The generic table access layer: five operations that work across every
//! table in [`Table`]. Identifiers spliced into SQL text always come from the
//! schema whitelist; values are bound as positional parameters.

use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AccessError, Result};

use super::schema::Table;
use super::value::{column_names, display_value, record_from_row, to_sql, Record};

/// Every row of a table plus its column names in declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Record>,
    /// Reported even when `rows` is empty.
    pub columns: Vec<String>,
}

/// Outcome of a single-row lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Record),
    NotFound,
}

impl Lookup {
    /// `Some(row)` on a hit, `None` on a miss.
    pub fn into_option(self) -> Option<Record> {
        match self {
            Lookup::Found(row) => Some(row),
            Lookup::NotFound => None,
        }
    }
}

/// Load every row of `table`. Column names come from `PRAGMA table_info` so
/// they follow the table's declared order.
pub fn query_all(conn: &Connection, table: Table) -> Result<QueryResult> {
    let mut stmt = conn.prepare(table.select_all_sql())?;
    let result_columns = column_names(&stmt);
    let rows = stmt
        .query_map([], |row| record_from_row(row, &result_columns))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let columns = table_columns(conn, table)?;
    debug!(table = table.name(), rows = rows.len(), "queried all rows");
    Ok(QueryResult { rows, columns })
}

/// Column names of `table` as the engine reports them.
pub fn table_columns(conn: &Connection, table: Table) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table.name()))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Look up one row by primary key without treating a miss as an error.
pub fn find_one(conn: &Connection, table: Table, key: &Value) -> Result<Lookup> {
    let mut stmt = conn.prepare(table.select_one_sql())?;
    let columns = column_names(&stmt);
    let row = stmt
        .query_row([to_sql(key)?], |row| record_from_row(row, &columns))
        .optional()?;

    let Some(row) = row else {
        warn!(
            table = table.name(),
            key = %display_value(key),
            "no row found for primary key"
        );
        return Ok(Lookup::NotFound);
    };

    Ok(Lookup::Found(row))
}

/// Fetch one row by primary key; a miss is an explicit [`AccessError::NotFound`].
pub fn query_one(conn: &Connection, table: Table, key: &Value) -> Result<Record> {
    match find_one(conn, table, key)? {
        Lookup::Found(row) => Ok(row),
        Lookup::NotFound => Err(AccessError::NotFound {
            table: table.name().to_string(),
            key: display_value(key),
        }),
    }
}

/// Insert `values` as a new row, binding columns in the mapping's order.
/// Returns the engine-assigned row identifier, which is the primary key.
pub fn insert_into_table(conn: &Connection, table: Table, values: &Record) -> Result<i64> {
    let columns = checked_columns(table, values)?;
    let placeholders = (1..=columns.len())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders
    );
    debug!(%sql, "insert");

    let params = values.values().map(to_sql).collect::<Result<Vec<_>>>()?;
    conn.execute(&sql, params_from_iter(params))?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite the columns named in `data` on the row(s) where `key_column`
/// equals `key`. Touching zero rows is not an error.
pub fn update_table_row(
    conn: &Connection,
    table: Table,
    key_column: &str,
    key: &Value,
    data: &Record,
) -> Result<String> {
    let key_column = table.checked_column(key_column)?;
    let columns = checked_columns(table, data)?;
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| format!("{column} = ?{}", idx + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        table.name(),
        assignments,
        key_column,
        columns.len() + 1
    );
    debug!(%sql, "update");

    let mut params = data.values().map(to_sql).collect::<Result<Vec<_>>>()?;
    params.push(to_sql(key)?);
    let updated = conn.execute(&sql, params_from_iter(params))?;
    debug!(table = table.name(), updated, "rows updated");

    Ok(format!("Row updated in {}", table.name()))
}

/// Delete the row(s) where `key_column` equals `key`. Deleting a missing key
/// succeeds.
pub fn delete_table_row(
    conn: &Connection,
    table: Table,
    key: &Value,
    key_column: &str,
) -> Result<()> {
    let key_column = table.checked_column(key_column)?;
    let sql = format!("DELETE FROM {} WHERE {} = ?1", table.name(), key_column);
    debug!(%sql, "delete");

    let deleted = conn.execute(&sql, [to_sql(key)?])?;
    debug!(table = table.name(), deleted, "rows deleted");
    Ok(())
}

/// Validate every key of `values` against the table's columns.
fn checked_columns(table: Table, values: &Record) -> Result<Vec<&'static str>> {
    if values.is_empty() {
        return Err(AccessError::EmptyValues {
            table: table.name().to_string(),
        });
    }
    values
        .keys()
        .map(|column| table.checked_column(column))
        .collect()
}
