//! Boundary between the presentation layer and the database. A dedicated
//! worker thread owns the [`Database`]; callers only ever get capability
//! handles that queue requests and await the reply. Requests run one at a
//! time in arrival order.

use std::thread::{self, JoinHandle};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::db::{self, raw, Database, QueryResult, Record, Table};
use crate::error::{AccessError, Result};
use crate::models::Entity;

const WORKER_NAME: &str = "student-records-db";

type Reply<T> = oneshot::Sender<Result<T>>;

enum Request {
    DbGet {
        sql: String,
        params: Vec<Value>,
        reply: Reply<Option<Record>>,
    },
    InsertUser {
        sql: String,
        params: Vec<Value>,
        reply: Reply<()>,
    },
    QueryAll {
        table: Table,
        reply: Reply<QueryResult>,
    },
    QueryOne {
        table: Table,
        key: Value,
        reply: Reply<Record>,
    },
    Insert {
        table: Table,
        values: Record,
        reply: Reply<i64>,
    },
    Update {
        table: Table,
        key_column: String,
        key: Value,
        data: Record,
        reply: Reply<String>,
    },
    Delete {
        table: Table,
        key: Value,
        key_column: String,
        reply: Reply<()>,
    },
    Shutdown,
}

/// Owner of the worker thread. Closing (or dropping) the bridge stops the
/// worker and closes the connection; outstanding capability handles then
/// fail with [`AccessError::BridgeClosed`].
pub struct Bridge {
    tx: mpsc::UnboundedSender<Request>,
    worker: Option<JoinHandle<Result<()>>>,
}

/// The three capability groups exposed to the presentation layer.
#[derive(Clone)]
pub struct Capabilities {
    pub db_get: DbGet,
    pub insert_user: InsertUser,
    pub my_api: MyApi,
}

impl Bridge {
    /// Move `database` onto a new worker thread.
    pub fn spawn(database: Database) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || serve(database, rx))?;
        info!("database bridge started");
        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    /// Hand out a fresh set of capability handles. Handles are cheap to clone
    /// and may outlive the bridge.
    pub fn expose(&self) -> Capabilities {
        let client = Client {
            tx: self.tx.clone(),
        };
        Capabilities {
            db_get: DbGet {
                client: client.clone(),
            },
            insert_user: InsertUser {
                client: client.clone(),
            },
            my_api: MyApi { client },
        }
    }

    /// Stop the worker after it drains requests already queued, and report
    /// the result of closing the connection.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        // The worker may already be gone if it panicked; joining tells us.
        let _ = self.tx.send(Request::Shutdown);
        match worker.join() {
            Ok(result) => result,
            Err(_) => {
                warn!("database worker panicked");
                Err(AccessError::BridgeClosed)
            }
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "database bridge shut down with error");
        }
    }
}

/// Worker loop: execute each request against the owned connection.
fn serve(database: Database, mut rx: mpsc::UnboundedReceiver<Request>) -> Result<()> {
    while let Some(request) = rx.blocking_recv() {
        let conn = database.conn();
        match request {
            Request::DbGet { sql, params, reply } => {
                let _ = reply.send(raw::db_get(conn, &sql, &params));
            }
            Request::InsertUser { sql, params, reply } => {
                let _ = reply.send(raw::run_statement(conn, &sql, &params));
            }
            Request::QueryAll { table, reply } => {
                let _ = reply.send(db::query_all(conn, table));
            }
            Request::QueryOne { table, key, reply } => {
                let _ = reply.send(db::query_one(conn, table, &key));
            }
            Request::Insert {
                table,
                values,
                reply,
            } => {
                let _ = reply.send(db::insert_into_table(conn, table, &values));
            }
            Request::Update {
                table,
                key_column,
                key,
                data,
                reply,
            } => {
                let _ = reply.send(db::update_table_row(
                    conn,
                    table,
                    &key_column,
                    &key,
                    &data,
                ));
            }
            Request::Delete {
                table,
                key,
                key_column,
                reply,
            } => {
                let _ = reply.send(db::delete_table_row(conn, table, &key, &key_column));
            }
            Request::Shutdown => break,
        }
    }

    debug!("database worker stopping");
    // Anything queued after the shutdown request is answered with
    // BridgeClosed when `rx` drops its pending senders.
    rx.close();
    database.close()?;
    info!("database bridge stopped");
    Ok(())
}

#[derive(Clone)]
struct Client {
    tx: mpsc::UnboundedSender<Request>,
}

impl Client {
    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .map_err(|_| AccessError::BridgeClosed)?;
        rx.await.map_err(|_| AccessError::BridgeClosed)?
    }
}

/// Raw single-row lookup capability.
#[derive(Clone)]
pub struct DbGet {
    client: Client,
}

impl DbGet {
    pub async fn db_get(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<Option<Record>> {
        let sql = sql.into();
        self.client
            .call(|reply| Request::DbGet { sql, params, reply })
            .await
    }
}

/// Raw single-statement execution capability.
#[derive(Clone)]
pub struct InsertUser {
    client: Client,
}

impl InsertUser {
    pub async fn insert_user(&self, sql: impl Into<String>, params: Vec<Value>) -> Result<()> {
        let sql = sql.into();
        self.client
            .call(|reply| Request::InsertUser { sql, params, reply })
            .await
    }
}

/// The structured table access layer.
#[derive(Clone)]
pub struct MyApi {
    client: Client,
}

impl MyApi {
    /// Every row of `table` plus its column list.
    pub async fn query_all(&self, table: Table) -> Result<QueryResult> {
        self.client
            .call(|reply| Request::QueryAll { table, reply })
            .await
    }

    /// Resolves to the row, or fails with [`AccessError::NotFound`].
    pub async fn query_one(&self, table: Table, key: impl Into<Value>) -> Result<Record> {
        let key = key.into();
        self.client
            .call(|reply| Request::QueryOne { table, key, reply })
            .await
    }

    /// Insert a row; resolves to its primary key.
    pub async fn insert_into_table(&self, table: Table, values: Record) -> Result<i64> {
        self.client
            .call(|reply| Request::Insert {
                table,
                values,
                reply,
            })
            .await
    }

    /// Overwrite the named columns where `key_column` equals `key`, resolving
    /// to a confirmation message.
    pub async fn update_table_row(
        &self,
        table: Table,
        key_column: impl Into<String>,
        key: impl Into<Value>,
        data: Record,
    ) -> Result<String> {
        let key_column = key_column.into();
        let key = key.into();
        self.client
            .call(|reply| Request::Update {
                table,
                key_column,
                key,
                data,
                reply,
            })
            .await
    }

    /// Delete the row(s) where `key_column` equals `key`.
    pub async fn delete_table_row(
        &self,
        table: Table,
        key: impl Into<Value>,
        key_column: impl Into<String>,
    ) -> Result<()> {
        let key = key.into();
        let key_column = key_column.into();
        self.client
            .call(|reply| Request::Delete {
                table,
                key,
                key_column,
                reply,
            })
            .await
    }

    /// Fetch a row and decode it into its typed model.
    pub async fn fetch<T: Entity>(&self, key: i64) -> Result<T> {
        T::from_record(self.query_one(T::TABLE, key).await?)
    }

    /// Insert a typed model into its table.
    pub async fn insert<T: Entity>(&self, entity: &T) -> Result<i64> {
        let values = entity.to_record()?;
        self.insert_into_table(T::TABLE, values).await
    }

    /// `query_all` for callers holding a table name from outside the crate.
    pub async fn query_all_by_name(&self, table: &str) -> Result<QueryResult> {
        let table = table.parse::<Table>()?;
        self.query_all(table).await
    }
}
