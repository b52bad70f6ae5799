//! Domain Model
//!
//! A [`DomainModel`] owns one database connection, opened on first use, and
//! the state of at most one transaction on it. CRUD statements are generated
//! from registry metadata; queries start from [`DomainModel::query`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backends::core::timeout_error;
use crate::backends::{self, DatabaseConnection, DatabaseRow};
use crate::config::DatabaseConfig;
use crate::dialect::SqlDialect;
use crate::error::{ModelError, ModelResult};
use crate::query::materialize::read_scalar;
use crate::query::{QueryBuilder, Statement};
use crate::schema::{DataObject, SchemaRegistry, ID_COLUMN};
use crate::transaction::Transaction;

/// Transaction state of a domain model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionState {
    Idle,
    Active,
    /// The handle was dropped without commit, or COMMIT failed; rolled back
    /// before the connection is used again
    RollbackPending,
    /// The connection was discarded while the transaction was open
    Lost,
}

/// Connection owner and entry point for CRUD and queries
pub struct DomainModel {
    config: DatabaseConfig,
    registry: Arc<SchemaRegistry>,
    dialect: SqlDialect,
    connection: Option<Box<dyn DatabaseConnection>>,
    transaction: TransactionState,
}

impl DomainModel {
    /// Create a model over `registry`. Nothing is opened until the first
    /// statement runs.
    pub fn new(config: DatabaseConfig, registry: Arc<SchemaRegistry>) -> Self {
        let dialect = config.dialect;
        Self {
            config,
            registry,
            dialect,
            connection: None,
            transaction: TransactionState::Idle,
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Whether the connection has been opened
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Whether a transaction is open on this model
    pub fn in_transaction(&self) -> bool {
        self.transaction == TransactionState::Active
    }

    /// Start a new query
    pub fn query(&mut self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// Open a transaction. Commit it through the returned handle; dropping
    /// the handle rolls it back.
    ///
    /// Called while a transaction is already open, this starts nothing and
    /// returns a handle that joins the outer transaction: its `commit` and
    /// `rollback` are no-ops and dropping it leaves the outer one alone.
    pub async fn begin_transaction(&mut self) -> ModelResult<Transaction<'_>> {
        if matches!(self.transaction, TransactionState::Active | TransactionState::Lost) {
            debug!("Joining the open transaction");
            return Ok(Transaction::joined(self));
        }

        let sql = self.dialect.begin_transaction();
        self.execute_batch(sql).await?;
        self.transaction = TransactionState::Active;
        debug!("Transaction started");

        Ok(Transaction::new(self))
    }

    /// Finish the active transaction with COMMIT or ROLLBACK
    pub(crate) async fn end_transaction(&mut self, commit: bool) -> ModelResult<()> {
        if self.transaction == TransactionState::Lost {
            self.transaction = TransactionState::Idle;
            return Err(ModelError::Transaction(
                "the connection was discarded, the transaction was rolled back".to_string(),
            ));
        }
        if self.transaction != TransactionState::Active || self.connection.is_none() {
            return Err(ModelError::Transaction(
                "no active transaction on this model".to_string(),
            ));
        }

        let sql = if commit {
            self.dialect.commit_transaction()
        } else {
            self.dialect.rollback_transaction()
        };
        match self.execute_batch(sql).await {
            Ok(()) => {
                self.transaction = TransactionState::Idle;
                debug!(commit, "Transaction finished");
                Ok(())
            }
            Err(e) => match self.transaction {
                TransactionState::Lost => {
                    self.transaction = TransactionState::Idle;
                    Err(ModelError::Transaction(format!(
                        "the transaction was lost with its connection: {}",
                        e
                    )))
                }
                _ => {
                    // the database may still hold the transaction open
                    self.transaction = TransactionState::RollbackPending;
                    Err(e)
                }
            },
        }
    }

    /// Mark the active transaction for rollback on next use
    pub(crate) fn abandon_transaction(&mut self) {
        match self.transaction {
            TransactionState::Active => self.transaction = TransactionState::RollbackPending,
            TransactionState::Lost => self.transaction = TransactionState::Idle,
            TransactionState::Idle | TransactionState::RollbackPending => {}
        }
    }

    /// INSERT `obj` and assign the generated id to it
    pub async fn create<T: DataObject>(&mut self, obj: &mut T) -> ModelResult<()> {
        let statement = self.insert_statement(obj)?;
        let rows = self.fetch_rows(&statement.sql, &statement.params, None).await?;
        let row = rows.first().ok_or_else(|| {
            ModelError::Database(format!("INSERT into {} returned no identity", T::TYPE_NAME))
        })?;

        let id = read_scalar::<i64>(row.as_ref())?;
        obj.set_id(id);
        debug!(type_name = T::TYPE_NAME, id, "Created row");
        Ok(())
    }

    /// Rewrite every column of the row with `obj`'s id
    pub async fn update<T: DataObject>(&mut self, obj: &T) -> ModelResult<u64> {
        let statement = self.update_statement(obj)?;
        self.execute_statement(&statement.sql, &statement.params).await
    }

    /// Delete the row with `id`
    pub async fn delete<T: DataObject>(&mut self, id: i64) -> ModelResult<u64> {
        let statement = self.delete_statement::<T>(id)?;
        self.execute_statement(&statement.sql, &statement.params).await
    }

    /// INSERT over the non-null, non-id columns of `obj`
    pub fn insert_statement<T: DataObject>(&self, obj: &T) -> ModelResult<Statement> {
        let metadata = self.registry.metadata::<T>()?;
        let mapper = self.registry.mapper::<T>()?;

        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        let mut params = Vec::new();
        for column in mapper.columns().iter().filter(|c| !c.is_id()) {
            let value = column.read(obj);
            if value.is_null() {
                continue;
            }
            columns.push(self.dialect.quote_identifier(column.name()));
            placeholders.push(self.dialect.parameter_placeholder(params.len()));
            params.push(value);
        }

        let sql = self
            .dialect
            .insert_returning_id(&metadata.name, &columns, &placeholders, ID_COLUMN);
        Ok(Statement::new(sql, params))
    }

    /// UPDATE of every non-id column, nulls included
    pub fn update_statement<T: DataObject>(&self, obj: &T) -> ModelResult<Statement> {
        let metadata = self.registry.metadata::<T>()?;
        let mapper = self.registry.mapper::<T>()?;

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for column in mapper.columns().iter().filter(|c| !c.is_id()) {
            assignments.push(format!(
                "{} = {}",
                self.dialect.quote_identifier(column.name()),
                self.dialect.parameter_placeholder(params.len())
            ));
            params.push(column.read(obj));
        }

        if assignments.is_empty() {
            return Err(ModelError::Query(format!(
                "{} has no columns to update",
                metadata.name
            )));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.dialect.quote_identifier(&metadata.name),
            assignments.join(", "),
            ID_COLUMN,
            obj.id()
        );
        Ok(Statement::new(sql, params))
    }

    pub fn delete_statement<T: DataObject>(&self, id: i64) -> ModelResult<Statement> {
        let metadata = self.registry.metadata::<T>()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.dialect.quote_identifier(&metadata.name),
            ID_COLUMN,
            id
        );
        Ok(Statement::new(sql, Vec::new()))
    }

    /// Close the connection, rolling back an open transaction first
    pub async fn close(mut self) -> ModelResult<()> {
        let timeout = self.config.command_timeout;
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        if matches!(
            self.transaction,
            TransactionState::Active | TransactionState::RollbackPending
        ) {
            debug!("Rolling back open transaction before close");
            let rollback = self.dialect.rollback_transaction();
            match tokio::time::timeout(timeout, connection.execute_batch(rollback)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Rollback before close failed"),
                Err(_) => {
                    warn!("Rollback before close timed out, dropping the connection");
                    return Err(timeout_error(timeout));
                }
            }
        }

        debug!("Closing database connection");
        connection.close().await
    }

    /// Open the connection if needed and run a pending rollback
    async fn connection(&mut self) -> ModelResult<&mut Box<dyn DatabaseConnection>> {
        let timeout = self.config.command_timeout;

        if self.transaction == TransactionState::Lost {
            return Err(ModelError::Transaction(
                "the connection was discarded, the transaction was rolled back".to_string(),
            ));
        }

        if self.connection.is_none() {
            self.connection = Some(backends::connect(&self.config).await?);
        }

        if self.transaction == TransactionState::RollbackPending {
            self.transaction = TransactionState::Idle;
            debug!("Rolling back abandoned transaction");
            let rollback = self.dialect.rollback_transaction();
            let connection = self.open_connection()?;
            let outcome = tokio::time::timeout(timeout, connection.execute_batch(rollback)).await;
            match outcome {
                // a failed COMMIT may already have ended the transaction
                Ok(result) => {
                    if let Err(e) = result {
                        warn!(error = %e, "Rollback of abandoned transaction failed");
                    }
                }
                Err(_) => return Err(self.discard_connection(rollback)),
            }
        }

        self.open_connection()
    }

    fn open_connection(&mut self) -> ModelResult<&mut Box<dyn DatabaseConnection>> {
        self.connection
            .as_mut()
            .ok_or_else(|| ModelError::Connection("database connection is not open".to_string()))
    }

    /// Drop a connection whose round-trip timed out. The driver may be in the
    /// middle of the exchange, so the connection is never reused; an open
    /// transaction on it is gone with it.
    fn discard_connection(&mut self, sql: &str) -> ModelError {
        warn!(sql, "Command timed out, discarding the connection");
        self.connection = None;
        self.transaction = match self.transaction {
            TransactionState::Active => TransactionState::Lost,
            TransactionState::RollbackPending | TransactionState::Idle => TransactionState::Idle,
            TransactionState::Lost => TransactionState::Lost,
        };
        timeout_error(self.config.command_timeout)
    }

    pub(crate) async fn fetch_rows(
        &mut self,
        sql: &str,
        params: &[crate::types::Value],
        limit: Option<usize>,
    ) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        let timeout = self.config.command_timeout;
        debug!(sql, params = params.len(), "Executing query");

        let connection = self.connection().await?;
        let outcome = tokio::time::timeout(timeout, connection.fetch(sql, params, limit)).await;
        match outcome {
            Ok(result) => result.inspect_err(|e| debug!(sql, error = %e, "Query failed")),
            Err(_) => Err(self.discard_connection(sql)),
        }
    }

    pub(crate) async fn execute_statement(
        &mut self,
        sql: &str,
        params: &[crate::types::Value],
    ) -> ModelResult<u64> {
        let timeout = self.config.command_timeout;
        debug!(sql, params = params.len(), "Executing statement");

        let connection = self.connection().await?;
        let outcome = tokio::time::timeout(timeout, connection.execute(sql, params)).await;
        match outcome {
            Ok(result) => result.inspect_err(|e| debug!(sql, error = %e, "Statement failed")),
            Err(_) => Err(self.discard_connection(sql)),
        }
    }

    async fn execute_batch(&mut self, sql: &str) -> ModelResult<()> {
        let timeout = self.config.command_timeout;
        debug!(sql, "Executing batch");

        let connection = self.connection().await?;
        let outcome = tokio::time::timeout(timeout, connection.execute_batch(sql)).await;
        match outcome {
            Ok(result) => result.inspect_err(|e| debug!(sql, error = %e, "Batch failed")),
            Err(_) => Err(self.discard_connection(sql)),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_connection(&mut self, connection: Box<dyn DatabaseConnection>) {
        self.connection = Some(connection);
    }
}

impl std::fmt::Debug for DomainModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainModel")
            .field("dialect", &self.dialect)
            .field("collections", &self.registry.len())
            .field("connected", &self.connection.is_some())
            .field("transaction", &self.transaction)
            .finish()
    }
}
