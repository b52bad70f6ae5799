//! Database Backend Abstractions
//!
//! A domain model owns exactly one [`DatabaseConnection`]. The concrete
//! driver is picked from the configured dialect: tiberius for SQL Server,
//! sqlx for SQLite.

pub mod core;
pub mod mssql;
pub mod sqlite;

pub use self::core::*;
pub use mssql::MssqlConnection;
pub use sqlite::SqliteDatabaseConnection;

use tracing::debug;

use crate::config::DatabaseConfig;
use crate::dialect::SqlDialect;
use crate::error::ModelResult;

/// Open a connection for `config`
pub async fn connect(config: &DatabaseConfig) -> ModelResult<Box<dyn DatabaseConnection>> {
    debug!(dialect = %config.dialect, "Opening database connection");

    let connection: Box<dyn DatabaseConnection> = match config.dialect {
        SqlDialect::SqlServer => {
            let open = MssqlConnection::connect(&config.connection_string);
            Box::new(with_timeout(config.command_timeout, open).await?)
        }
        SqlDialect::Sqlite => {
            let open = SqliteDatabaseConnection::connect(&config.connection_string, config.command_timeout);
            Box::new(with_timeout(config.command_timeout, open).await?)
        }
    };

    Ok(connection)
}
