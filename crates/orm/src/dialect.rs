//! SQL dialects
//!
//! Everything that differs between the supported databases when rendering a
//! statement: identifier quoting, parameter placeholders, identity return,
//! pagination and transaction control.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// SQL dialect enumeration for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SqlDialect {
    SqlServer,
    Sqlite,
}

impl SqlDialect {
    /// Placeholder for the zero-based parameter `index`
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::SqlServer => format!("@_p{}", index),
            SqlDialect::Sqlite => format!("?{}", index + 1),
        }
    }

    /// Opening and closing identifier quotes
    pub fn identifier_quotes(&self) -> (char, char) {
        match self {
            SqlDialect::SqlServer => ('[', ']'),
            SqlDialect::Sqlite => ('"', '"'),
        }
    }

    /// Quote a table or column identifier
    pub fn quote_identifier(&self, identifier: &str) -> String {
        let (open, close) = self.identifier_quotes();
        let escaped = identifier.replace(close, &format!("{}{}", close, close));
        format!("{}{}{}", open, escaped, close)
    }

    /// `INSERT` statement that returns the generated identity. `columns` are
    /// already quoted.
    pub fn insert_returning_id(
        &self,
        table: &str,
        columns: &[String],
        placeholders: &[String],
        id_column: &str,
    ) -> String {
        let table = self.quote_identifier(table);

        match self {
            SqlDialect::SqlServer => {
                if columns.is_empty() {
                    format!("INSERT INTO {} OUTPUT INSERTED.{} DEFAULT VALUES", table, id_column)
                } else {
                    format!(
                        "INSERT INTO {} ({}) OUTPUT INSERTED.{} VALUES ({})",
                        table,
                        columns.join(", "),
                        id_column,
                        placeholders.join(", ")
                    )
                }
            }
            SqlDialect::Sqlite => {
                if columns.is_empty() {
                    format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, id_column)
                } else {
                    format!(
                        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                        table,
                        columns.join(", "),
                        placeholders.join(", "),
                        id_column
                    )
                }
            }
        }
    }

    /// Row window appended after the ORDER BY clause. SQL Server requires an
    /// ORDER BY for OFFSET/FETCH, so `has_order` decides whether a neutral one
    /// is emitted.
    pub fn pagination(&self, offset: u64, count: u64, has_order: bool) -> String {
        match self {
            SqlDialect::SqlServer => {
                let order = if has_order { "" } else { " ORDER BY (SELECT NULL)" };
                format!("{} OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", order, offset, count)
            }
            SqlDialect::Sqlite => format!(" LIMIT {} OFFSET {}", count, offset),
        }
    }

    pub fn begin_transaction(&self) -> &'static str {
        match self {
            SqlDialect::SqlServer => "BEGIN TRANSACTION",
            SqlDialect::Sqlite => "BEGIN",
        }
    }

    pub fn commit_transaction(&self) -> &'static str {
        match self {
            SqlDialect::SqlServer => "COMMIT TRANSACTION",
            SqlDialect::Sqlite => "COMMIT",
        }
    }

    pub fn rollback_transaction(&self) -> &'static str {
        match self {
            SqlDialect::SqlServer => "ROLLBACK TRANSACTION",
            SqlDialect::Sqlite => "ROLLBACK",
        }
    }

    /// Detect the dialect from a connection string
    pub fn from_connection_string(connection: &str) -> Option<Self> {
        let lower = connection.trim().to_lowercase();
        if lower.starts_with("sqlite:") {
            Some(SqlDialect::Sqlite)
        } else if lower.starts_with("mssql://")
            || lower.starts_with("sqlserver://")
            || lower.starts_with("server=")
            || lower.starts_with("data source=")
        {
            Some(SqlDialect::SqlServer)
        } else {
            None
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::SqlServer => write!(f, "sqlserver"),
            SqlDialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlserver" | "mssql" | "tsql" => Ok(SqlDialect::SqlServer),
            "sqlite" => Ok(SqlDialect::Sqlite),
            _ => Err(format!("Unsupported SQL dialect: {}", s)),
        }
    }
}
