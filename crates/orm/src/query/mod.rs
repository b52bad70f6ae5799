//! Query Builder Module - fluent SELECT builder and raw statement execution

pub mod builder;
pub mod execution;
pub mod filter;
pub mod joins;
pub mod materialize;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use filter::{parse_filter, FilterRenderer, FilterToken};
pub use types::{JoinType, OrderDirection, Statement};
