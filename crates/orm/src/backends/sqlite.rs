//! SQLite Backend Implementation
//!
//! Single sqlx connection. Statements arrive with `?N` placeholders, which
//! SQLite binds by number, so a back-referenced parameter is bound once.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use super::core::{unsupported_cell, DatabaseConnection, DatabaseRow};
use crate::dialect::SqlDialect;
use crate::error::{ModelError, ModelResult};
use crate::types::{Value, WireType};

/// SQLite connection owned by a domain model
pub struct SqliteDatabaseConnection {
    conn: SqliteConnection,
}

impl SqliteDatabaseConnection {
    /// Open `url` (`sqlite::memory:`, `sqlite://path/to.db`), creating the
    /// database file when missing
    pub async fn connect(url: &str, busy_timeout: Duration) -> ModelResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| ModelError::Connection(format!("Invalid SQLite URL: {}", e)))?
            .create_if_missing(true)
            .busy_timeout(busy_timeout);

        let conn = options
            .connect()
            .await
            .map_err(|e| ModelError::Connection(format!("Failed to open SQLite database: {}", e)))?;

        debug!("Opened SQLite connection");
        Ok(Self { conn })
    }
}

fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Value],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null(wire_type) => match wire_type {
                WireType::String => query.bind(None::<String>),
                WireType::Int32 => query.bind(None::<i32>),
                WireType::Int64 => query.bind(None::<i64>),
                WireType::DateTime2 => query.bind(None::<NaiveDateTime>),
                WireType::Double => query.bind(None::<f64>),
                WireType::Boolean => query.bind(None::<bool>),
                WireType::VarBinary => query.bind(None::<Vec<u8>>),
            },
            Value::String(s) => query.bind(s.as_str()),
            Value::Int32(i) => query.bind(*i),
            Value::Int64(i) => query.bind(*i),
            Value::DateTime(dt) => query.bind(*dt),
            Value::Double(f) => query.bind(*f),
            Value::Boolean(b) => query.bind(*b),
            Value::Bytes(b) => query.bind(b.as_slice()),
        };
    }
    query
}

#[async_trait]
impl DatabaseConnection for SqliteDatabaseConnection {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> ModelResult<u64> {
        let result = bind_params(sqlx::query(sql), params)
            .execute(&mut self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch(
        &mut self,
        sql: &str,
        params: &[Value],
        limit: Option<usize>,
    ) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        let mut rows: Vec<Box<dyn DatabaseRow>> = Vec::new();
        if limit == Some(0) {
            return Ok(rows);
        }

        let mut stream = bind_params(sqlx::query(sql), params).fetch(&mut self.conn);
        while let Some(row) = stream.try_next().await? {
            rows.push(Box::new(SqliteDatabaseRow { row }));
            if limit.is_some_and(|limit| rows.len() >= limit) {
                break;
            }
        }
        Ok(rows)
    }

    async fn execute_batch(&mut self, sql: &str) -> ModelResult<()> {
        self.conn.execute(sql).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> ModelResult<()> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Row read from SQLite
pub struct SqliteDatabaseRow {
    row: SqliteRow,
}

impl SqliteDatabaseRow {
    fn decode<T>(&self, index: usize) -> ModelResult<Option<T>>
    where
        T: for<'r> sqlx::Decode<'r, Sqlite>,
    {
        // SQLite columns carry affinities rather than strict types
        self.row
            .try_get_unchecked::<Option<T>, _>(index)
            .map_err(ModelError::from)
    }
}

impl DatabaseRow for SqliteDatabaseRow {
    fn column_names(&self) -> Vec<String> {
        self.row
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    fn column_count(&self) -> usize {
        self.row.columns().len()
    }

    fn read(&self, index: usize, wire_type: WireType) -> ModelResult<Option<Value>> {
        let raw = self.row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(None);
        }
        let storage = raw.type_info().name().to_string();

        let value = match wire_type {
            WireType::String => self.decode::<String>(index)?.map(Value::String),
            // sqlx truncates INTEGER storage to the target width, so widen
            // first and narrow with a range check
            WireType::Int32 => match self.decode::<i64>(index)? {
                Some(v) => Some(Value::Int32(i32::try_from(v).map_err(|_| {
                    ModelError::Decode(format!("{} in column {} does not fit in Int32", v, index))
                })?)),
                None => None,
            },
            WireType::Int64 => self.decode::<i64>(index)?.map(Value::Int64),
            WireType::DateTime2 => {
                if storage == "BLOB" {
                    return Err(unsupported_cell(index, wire_type, &storage));
                }
                self.decode::<NaiveDateTime>(index)?.map(Value::DateTime)
            }
            WireType::Double => self.decode::<f64>(index)?.map(Value::Double),
            WireType::Boolean => self.decode::<bool>(index)?.map(Value::Boolean),
            WireType::VarBinary => {
                if storage != "BLOB" {
                    return Err(unsupported_cell(index, wire_type, &storage));
                }
                self.decode::<Vec<u8>>(index)?.map(Value::Bytes)
            }
        };
        Ok(value)
    }
}
