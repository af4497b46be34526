//! Raw statement execution for callers that bring their own SQL, such as the
//! login lookup. Parameters are still bound positionally.

use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;

use super::value::{column_names, record_from_row, to_sql_params, Record};

/// Run `sql` and return its first row, if any.
pub fn db_get(conn: &Connection, sql: &str, params: &[Value]) -> Result<Option<Record>> {
    debug!(%sql, "raw query");
    let mut stmt = conn.prepare(sql)?;
    let columns = column_names(&stmt);
    let row = stmt
        .query_row(params_from_iter(to_sql_params(params)?), |row| {
            record_from_row(row, &columns)
        })
        .optional()?;
    Ok(row)
}

/// Execute a single statement that returns no rows.
pub fn run_statement(conn: &Connection, sql: &str, params: &[Value]) -> Result<()> {
    debug!(%sql, "raw statement");
    let changed = conn.execute(sql, params_from_iter(to_sql_params(params)?))?;
    info!(changed, rowid = conn.last_insert_rowid(), "statement completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::Database;

    #[test]
    fn run_then_get_by_credentials() {
        let db = Database::open_in_memory().unwrap();
        run_statement(
            db.conn(),
            "INSERT INTO user_reg VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            &[
                json!(10),
                json!("Grace"),
                json!("Hopper"),
                json!("Arlington"),
                json!("555-0110"),
                json!("grace@example.com"),
                json!("1906-12-09"),
                json!("cobol"),
            ],
        )
        .unwrap();

        let row = db_get(
            db.conn(),
            "SELECT student_id, first_name FROM user_reg WHERE email = ? AND password = ?",
            &[json!("grace@example.com"), json!("cobol")],
        )
        .unwrap()
        .unwrap();
        assert_eq!(row["student_id"], json!(10));
        assert_eq!(row["first_name"], json!("Grace"));

        let miss = db_get(
            db.conn(),
            "SELECT student_id FROM user_reg WHERE email = ? AND password = ?",
            &[json!("grace@example.com"), json!("wrong")],
        )
        .unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn malformed_sql_propagates_driver_error() {
        let db = Database::open_in_memory().unwrap();
        let err = db_get(db.conn(), "SELEC nonsense", &[]).unwrap_err();
        assert!(matches!(err, crate::error::AccessError::Sqlite(_)));
    }
}
