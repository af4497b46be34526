//! Conversion between the JSON values that cross the bridge and the values
//! SQLite binds and returns.

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Row, Statement};
use serde_json::{Map, Number, Value};

use crate::error::{AccessError, Result};

/// A row keyed by column name, in the order the statement produced them.
pub type Record = Map<String, Value>;

/// Turn a JSON value into a bindable SQLite value.
pub fn to_sql(value: &Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Ok(SqlValue::Integer(int))
            } else if let Some(float) = number.as_f64() {
                Ok(SqlValue::Real(float))
            } else {
                Err(AccessError::UnsupportedValue(number.to_string()))
            }
        }
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(AccessError::UnsupportedValue(value.to_string())),
    }
}

/// Convert a list of positional parameters.
pub fn to_sql_params<'a, I>(values: I) -> Result<Vec<SqlValue>>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().map(to_sql).collect()
}

/// Read a SQLite value back into JSON. Blobs become arrays of bytes; reals
/// that JSON cannot express (NaN, infinities) become null.
pub fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(int) => Value::from(int),
        ValueRef::Real(float) => Number::from_f64(float).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Column names of a prepared statement, in result order.
pub fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Build a [`Record`] from a row using the statement's column names.
pub fn record_from_row(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::with_capacity(columns.len());
    for (idx, name) in columns.iter().enumerate() {
        record.insert(name.clone(), from_sql(row.get_ref(idx)?));
    }
    Ok(record)
}

/// Render a key value for error messages and logs without JSON quoting.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
