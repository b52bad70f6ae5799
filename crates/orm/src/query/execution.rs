//! Query Builder terminal methods
//!
//! Every terminal consumes the builder. Typed terminals add an implicit
//! `from::<T>()` when no FROM clause was given.

use super::builder::QueryBuilder;
use super::filter::FilterRenderer;
use super::materialize::{materialize, read_scalar};
use crate::error::{ModelError, ModelResult};
use crate::schema::{DataObject, ID_COLUMN};
use crate::types::{SqlType, Value};

impl<'m> QueryBuilder<'m> {
    /// Row with the given id
    pub async fn find<T: DataObject>(self, id: i64) -> ModelResult<T> {
        self.where_id::<T>(id).first::<T>().await
    }

    /// Row with the given id, or `None`
    pub async fn find_or_default<T: DataObject>(self, id: i64) -> ModelResult<Option<T>> {
        self.where_id::<T>(id).first_or_default::<T>().await
    }

    fn where_id<T: DataObject>(self, id: i64) -> Self {
        let query = self.ensure_from::<T>();
        let column = match &query.from_table {
            Some(from) => format!("{}.{}", from.qualifier(), ID_COLUMN),
            None => ID_COLUMN.to_string(),
        };
        query.where_sql(&format!("{} = $", column), vec![Value::Int64(id)])
    }

    /// Every matching row
    pub async fn to_list<T: DataObject>(self) -> ModelResult<Vec<T>> {
        self.fetch_objects::<T>(None).await
    }

    /// First matching row; fails with [`ModelError::NotFound`] on an empty
    /// result
    pub async fn first<T: DataObject>(self) -> ModelResult<T> {
        let table = self.registry.metadata::<T>()?.name.clone();
        self.fetch_objects::<T>(Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or(ModelError::NotFound(table))
    }

    /// First matching row, or `None`
    pub async fn first_or_default<T: DataObject>(self) -> ModelResult<Option<T>> {
        Ok(self.fetch_objects::<T>(Some(1)).await?.into_iter().next())
    }

    async fn fetch_objects<T: DataObject>(self, limit: Option<usize>) -> ModelResult<Vec<T>> {
        let query = self.ensure_from::<T>();
        query.check()?;

        let mapper = query.registry.mapper::<T>()?;
        let sql = query.build_select_sql(None, true);
        let rows = query.model.fetch_rows(&sql, &query.params, limit).await?;
        materialize(&mapper, &rows)
    }

    /// Number of matching rows
    pub async fn count(self) -> ModelResult<i64> {
        self.require_from("count")?;
        self.check()?;

        let sql = self.build_count_sql();
        let rows = self.model.fetch_rows(&sql, &self.params, Some(1)).await?;
        match rows.first() {
            Some(row) => read_scalar::<i64>(row.as_ref()),
            None => Ok(0),
        }
    }

    /// Ids of every matching row
    pub async fn to_id_list(self) -> ModelResult<Vec<i64>> {
        self.require_from("to_id_list")?;
        self.check()?;

        let projection = match &self.from_table {
            Some(from) => format!("{}.{}", from.qualifier(), ID_COLUMN),
            None => ID_COLUMN.to_string(),
        };
        let sql = self.build_select_sql(Some(&projection), true);
        let rows = self.model.fetch_rows(&sql, &self.params, None).await?;
        rows.iter().map(|row| read_scalar::<i64>(row.as_ref())).collect()
    }

    /// Run raw SQL written in the filter mini-language and materialize `T`
    pub async fn execute<T: DataObject>(self, sql: &str, args: Vec<Value>) -> ModelResult<Vec<T>> {
        let mapper = self.registry.mapper::<T>()?;
        let (sql, params) = self.render_raw(sql, args)?;
        let rows = self.model.fetch_rows(&sql, &params, None).await?;
        materialize(&mapper, &rows)
    }

    /// Run raw SQL and return the affected row count
    pub async fn execute_non_query(self, sql: &str, args: Vec<Value>) -> ModelResult<u64> {
        let (sql, params) = self.render_raw(sql, args)?;
        self.model.execute_statement(&sql, &params).await
    }

    /// Run raw SQL and decode the first cell of the first row. An empty
    /// result is `NotFound` unless `S` is nullable.
    pub async fn execute_scalar<S: SqlType>(self, sql: &str, args: Vec<Value>) -> ModelResult<S> {
        let (sql, params) = self.render_raw(sql, args)?;
        let rows = self.model.fetch_rows(&sql, &params, Some(1)).await?;
        match rows.first() {
            Some(row) => read_scalar::<S>(row.as_ref()),
            None if S::NULLABLE => S::from_value(Value::Null(S::WIRE_TYPE)),
            None => Err(ModelError::NotFound(format!("no row returned by '{}'", sql))),
        }
    }

    fn render_raw(&self, sql: &str, args: Vec<Value>) -> ModelResult<(String, Vec<Value>)> {
        let mut params = Vec::new();
        let sql = FilterRenderer::new(&self.registry, self.dialect).render(sql, args, &mut params)?;
        Ok((sql, params))
    }

    fn ensure_from<T: DataObject>(self) -> Self {
        if self.from_table.is_some() {
            self
        } else {
            self.from::<T>()
        }
    }

    fn require_from(&self, terminal: &str) -> ModelResult<()> {
        if self.from_table.is_none() && self.error.is_none() {
            return Err(ModelError::Query(format!("{} requires a FROM clause", terminal)));
        }
        Ok(())
    }
}
