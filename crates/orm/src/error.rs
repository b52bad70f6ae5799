//! Error types for the data-access layer
//!
//! Every fallible operation returns [`ModelResult`]. Driver errors are
//! converted into [`ModelError::Database`] with their original message so
//! callers see exactly what the database reported.

use std::fmt;

use crate::config::ConfigError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Driver error while executing a statement or reading a result
    Database(String),
    /// Connection could not be opened or was lost
    Connection(String),
    /// A query that must produce a row produced none
    NotFound(String),
    /// Unregistered type, table name or collection id
    Lookup(String),
    /// A type or table name was registered twice
    DuplicateRegistration(String),
    /// A database column cannot be represented by any wire type
    UnsupportedType(String),
    /// A value could not be converted into the requested host type
    Decode(String),
    /// Malformed filter template or incomplete query
    Query(String),
    /// Transaction misuse (commit without an active transaction, nesting)
    Transaction(String),
    /// Invalid or missing configuration
    Configuration(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ModelError::NotFound(what) => write!(f, "Record not found: {}", what),
            ModelError::Lookup(msg) => write!(f, "Lookup error: {}", msg),
            ModelError::DuplicateRegistration(msg) => write!(f, "Duplicate registration: {}", msg),
            ModelError::UnsupportedType(msg) => write!(f, "Unsupported type: {}", msg),
            ModelError::Decode(msg) => write!(f, "Decode error: {}", msg),
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Transaction(msg) => write!(f, "Transaction error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

impl ModelError {
    /// True for errors raised by the driver while talking to the database
    pub fn is_database(&self) -> bool {
        matches!(self, ModelError::Database(_) | ModelError::Connection(_))
    }

    /// True when a lookup against the schema registry failed
    pub fn is_lookup(&self) -> bool {
        matches!(self, ModelError::Lookup(_))
    }
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { index, source } => {
                ModelError::Decode(format!("column {}: {}", index, source))
            }
            sqlx::Error::Io(e) => ModelError::Connection(e.to_string()),
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
                ModelError::Connection(err.to_string())
            }
            other => ModelError::Database(other.to_string()),
        }
    }
}

impl From<tiberius::error::Error> for ModelError {
    fn from(err: tiberius::error::Error) -> Self {
        match err {
            tiberius::error::Error::Io { message, .. } => ModelError::Connection(message),
            tiberius::error::Error::Conversion(msg) => ModelError::Decode(msg.to_string()),
            other => ModelError::Database(other.to_string()),
        }
    }
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}
