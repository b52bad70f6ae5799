//! Query Builder JOIN operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::schema::DataObject;

impl<'m> QueryBuilder<'m> {
    /// Add INNER JOIN on the table of `T`. `on` may reference tables with
    /// `$-Name` tokens.
    pub fn join<T: DataObject>(self, alias: &str, on: &str) -> Self {
        self.join_clause::<T>(JoinType::Inner, alias, on)
    }

    /// Add LEFT JOIN on the table of `T`
    pub fn left_join<T: DataObject>(self, alias: &str, on: &str) -> Self {
        self.join_clause::<T>(JoinType::Left, alias, on)
    }

    /// Add RIGHT JOIN on the table of `T`
    pub fn right_join<T: DataObject>(self, alias: &str, on: &str) -> Self {
        self.join_clause::<T>(JoinType::Right, alias, on)
    }

    fn join_clause<T: DataObject>(mut self, join_type: JoinType, alias: &str, on: &str) -> Self {
        let clause = self.quoted_table::<T>().and_then(|table| {
            let on = self.renderer().render_static(on)?;
            Ok(JoinClause {
                join_type,
                table,
                alias: (!alias.is_empty()).then(|| alias.to_string()),
                on,
            })
        });

        match clause {
            Ok(clause) => self.joins.push(clause),
            Err(e) => self.fail(e),
        }
        self
    }
}
