//! Core Database Backend Traits
//!
//! A domain model talks to its database through these two traits only. Each
//! backend renders nothing itself: it receives finished SQL in its own
//! dialect plus the ordered parameter values, and hands back rows that can be
//! read column by column with an explicit wire type.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::dialect::SqlDialect;
use crate::error::{ModelError, ModelResult};
use crate::types::{Value, WireType};

/// Single open database connection
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Dialect the connection expects statements in
    fn dialect(&self) -> SqlDialect;

    /// Execute a statement and return the affected row count
    async fn execute(&mut self, sql: &str, params: &[Value]) -> ModelResult<u64>;

    /// Execute a query and return its rows. With `limit`, reading stops
    /// once that many rows were received.
    async fn fetch(
        &mut self,
        sql: &str,
        params: &[Value],
        limit: Option<usize>,
    ) -> ModelResult<Vec<Box<dyn DatabaseRow>>>;

    /// Run an unparameterized batch, used for transaction control
    async fn execute_batch(&mut self, sql: &str) -> ModelResult<()>;

    /// Close the connection
    async fn close(self: Box<Self>) -> ModelResult<()>;
}

/// One row of a result set
pub trait DatabaseRow: Send + Sync {
    /// Result column names in ordinal order
    fn column_names(&self) -> Vec<String>;

    /// Get column count
    fn column_count(&self) -> usize;

    /// Read the cell at `index` through the accessor for `wire_type`.
    /// `Ok(None)` means SQL NULL.
    fn read(&self, index: usize, wire_type: WireType) -> ModelResult<Option<Value>>;
}

/// Bound an operation by the configured command timeout. Whatever the
/// future owns is dropped with it on elapse, so use it for operations that
/// own their connection, such as opening or closing one.
pub async fn with_timeout<T, F>(timeout: Duration, operation: F) -> ModelResult<T>
where
    F: Future<Output = ModelResult<T>>,
{
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| timeout_error(timeout))?
}

pub(crate) fn timeout_error(timeout: Duration) -> ModelError {
    ModelError::Database(format!(
        "command timed out after {} seconds",
        timeout.as_secs_f64()
    ))
}

/// Error for a cell whose driver type has no reader for `wire_type`
pub(crate) fn unsupported_cell(index: usize, wire_type: WireType, driver_type: &str) -> ModelError {
    ModelError::UnsupportedType(format!(
        "column {} of type {} cannot be read as {}",
        index, driver_type, wire_type
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_results_through() {
        let value = with_timeout(Duration::from_secs(1), async { Ok::<_, ModelError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let err = with_timeout(Duration::from_secs(1), async {
            Err::<i32, _>(ModelError::Query("bad".into()))
        })
        .await
        .unwrap_err();
        assert_eq!(err, ModelError::Query("bad".into()));
    }

    #[tokio::test]
    async fn test_with_timeout_elapses() {
        let err = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ModelError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ModelError::Database(msg) if msg.contains("timed out")));
    }
}
