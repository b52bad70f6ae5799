//! Query Builder - Core builder implementation

use std::sync::Arc;

use super::filter::FilterRenderer;
use super::types::*;
use crate::dialect::SqlDialect;
use crate::domain::DomainModel;
use crate::error::{ModelError, ModelResult};
use crate::schema::{DataObject, SchemaRegistry};
use crate::types::Value;

/// Fluent SQL builder bound to one domain model.
///
/// Every fluent call consumes and returns the builder. Errors raised while
/// building (unregistered types, malformed filters) are kept until a
/// terminal method runs, which then returns the first of them.
pub struct QueryBuilder<'m> {
    pub(crate) model: &'m mut DomainModel,
    pub(crate) registry: Arc<SchemaRegistry>,
    pub(crate) dialect: SqlDialect,
    pub(crate) select_fields: Vec<String>,
    pub(crate) from_table: Option<FromClause>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) where_clauses: Vec<String>,
    pub(crate) group_by: Vec<String>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit: Option<(u64, u64)>,
    pub(crate) params: Vec<Value>,
    pub(crate) error: Option<ModelError>,
}

impl<'m> QueryBuilder<'m> {
    /// Create a new query builder
    pub fn new(model: &'m mut DomainModel) -> Self {
        let registry = Arc::clone(model.registry());
        let dialect = model.dialect();
        Self {
            model,
            registry,
            dialect,
            select_fields: Vec::new(),
            from_table: None,
            joins: Vec::new(),
            where_clauses: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            params: Vec::new(),
            error: None,
        }
    }

    /// Discard this builder and start an unrelated statement on the same model
    pub fn new_query(self) -> QueryBuilder<'m> {
        QueryBuilder::new(self.model)
    }

    /// Select from the table of `T`
    pub fn from<T: DataObject>(self) -> Self {
        self.from_clause::<T>(None)
    }

    /// Select from the table of `T` under `alias`
    pub fn from_as<T: DataObject>(self, alias: &str) -> Self {
        self.from_clause::<T>(Some(alias))
    }

    fn from_clause<T: DataObject>(mut self, alias: Option<&str>) -> Self {
        match self.quoted_table::<T>() {
            Ok(table) => {
                self.from_table = Some(FromClause {
                    table,
                    alias: alias.map(str::to_string),
                });
            }
            Err(e) => self.fail(e),
        }
        self
    }

    /// Replace the default `table.*` projection
    pub fn select(mut self, fields: &str) -> Self {
        self.select_fields.push(fields.to_string());
        self
    }

    /// Rendered SQL text of the current state
    pub fn to_sql(&self) -> String {
        self.build_select_sql(None, true)
    }

    /// Parameters bound so far, in placeholder order
    pub fn parameters(&self) -> &[Value] {
        &self.params
    }

    /// Rendered SQL and its parameters
    pub fn to_statement(&self) -> ModelResult<Statement> {
        self.check()?;
        Ok(Statement::new(self.to_sql(), self.params.clone()))
    }

    pub(crate) fn renderer(&self) -> FilterRenderer<'_> {
        FilterRenderer::new(&self.registry, self.dialect)
    }

    pub(crate) fn quoted_table<T: DataObject>(&self) -> ModelResult<String> {
        let metadata = self.registry.metadata::<T>()?;
        Ok(self.dialect.quote_identifier(&metadata.name))
    }

    /// Keep the first build error for the terminal method
    pub(crate) fn fail(&mut self, error: ModelError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(crate) fn check(&self) -> ModelResult<()> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
