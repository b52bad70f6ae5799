//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use crate::schema::ID_COLUMN;
use crate::types::Value;

impl<'m> QueryBuilder<'m> {
    /// Add a filter written in the `$` mini-language (see
    /// [`filter`](super::filter)). Multiple filters are joined with `AND`.
    pub fn where_sql(mut self, template: &str, args: Vec<Value>) -> Self {
        let mut params = std::mem::take(&mut self.params);
        let rendered = self.renderer().render(template, args, &mut params);
        self.params = params;

        match rendered {
            Ok(clause) => self.where_clauses.push(clause),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        let template = format!("{} = $", column);
        self.where_sql(&template, vec![value.into()])
    }

    /// Restrict to the given ids, inlined as literals. An empty set matches
    /// nothing.
    pub fn where_ids(mut self, ids: &[i64]) -> Self {
        let clause = if ids.is_empty() {
            "1 = 0".to_string()
        } else {
            let list: Vec<String> = ids.iter().map(i64::to_string).collect();
            format!("{} IN ({})", ID_COLUMN, list.join(","))
        };
        self.where_clauses.push(clause);
        self
    }
}
