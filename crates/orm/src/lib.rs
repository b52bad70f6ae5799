//! # domain-orm: registry-driven data access
//!
//! Data objects are registered once in a [`SchemaRegistry`], which derives
//! their table metadata. A [`DomainModel`] owns a connection to SQL Server or
//! SQLite and offers CRUD, explicit transactions and a fluent
//! [`QueryBuilder`] whose filters use a small `$` placeholder language.

pub mod backends;
pub mod config;
pub mod dialect;
pub mod domain;
pub mod error;
pub mod logging;
pub mod query;
pub mod schema;
pub mod transaction;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, DatabaseConfig, EnvConfig, LogFormat, LoggingConfig};
pub use dialect::SqlDialect;
pub use domain::DomainModel;
pub use error::{ModelError, ModelResult};
pub use logging::init_logging;
pub use query::{QueryBuilder, Statement};
pub use schema::{
    Collection, CollectionId, Column, ColumnMetadata, DataObject, EntityMapper, SchemaRegistry,
    TableMetadata, ID_COLUMN,
};
pub use transaction::Transaction;
pub use types::{SqlEnum, SqlType, Value, WireType};
