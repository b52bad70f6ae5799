//! Query Builder Types - Core types and enums for query building

use std::fmt;

use serde::Serialize;

use crate::types::Value;

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
        }
    }
}

/// Join clause with its already rendered ON condition
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    /// Quoted table name
    pub table: String,
    pub alias: Option<String>,
    pub on: String,
}

/// FROM target
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    /// Quoted table name
    pub table: String,
    pub alias: Option<String>,
}

impl FromClause {
    /// Prefix used by the default `{table}.*` projection
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Rendered SQL text plus its ordered parameter values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    #[serde(serialize_with = "serialize_params")]
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

fn serialize_params<S: serde::Serializer>(params: &[Value], serializer: S) -> Result<S::Ok, S::Error> {
    let json: Vec<serde_json::Value> = params.iter().map(Value::to_json).collect();
    json.serialize(serializer)
}
