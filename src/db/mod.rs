//! Persistence module split across logical submodules.

mod connection;
pub mod raw;
pub mod schema;
pub mod tables;
pub mod value;

pub use connection::Database;
pub use schema::{ColumnDef, ColumnType, Table};
pub use tables::{
    delete_table_row, find_one, insert_into_table, query_all, query_one, table_columns,
    update_table_row, Lookup, QueryResult,
};
pub use value::Record;
