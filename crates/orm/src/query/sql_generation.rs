//! Query Builder SQL generation

use super::builder::QueryBuilder;
use super::types::*;

impl<'m> QueryBuilder<'m> {
    /// Build the SELECT statement. `projection` replaces the select list;
    /// `windowed` controls whether ORDER BY and the row window are rendered.
    pub(crate) fn build_select_sql(&self, projection: Option<&str>, windowed: bool) -> String {
        let mut sql = String::from("SELECT ");

        match projection {
            Some(projection) => sql.push_str(projection),
            None if !self.select_fields.is_empty() => sql.push_str(&self.select_fields.join(", ")),
            None => match &self.from_table {
                Some(from) => {
                    sql.push_str(from.qualifier());
                    sql.push_str(".*");
                }
                None => sql.push('*'),
            },
        }

        if let Some(from) = &self.from_table {
            sql.push_str(" FROM ");
            sql.push_str(&from.table);
            if let Some(alias) = &from.alias {
                sql.push(' ');
                sql.push_str(alias);
            }
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.join_type.to_string());
            sql.push(' ');
            sql.push_str(&join.table);
            if let Some(alias) = &join.alias {
                sql.push(' ');
                sql.push_str(alias);
            }
            sql.push_str(" ON ");
            sql.push_str(&join.on);
        }

        self.build_where_clause(&mut sql);

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if windowed {
            self.build_order_limit_clause(&mut sql);
        }

        sql
    }

    /// `SELECT COUNT(*)` over the filtered rows, ignoring order and window
    pub(crate) fn build_count_sql(&self) -> String {
        if self.group_by.is_empty() {
            self.build_select_sql(Some("COUNT(*)"), false)
        } else {
            format!(
                "SELECT COUNT(*) FROM ({}) AS grouped_rows",
                self.build_select_sql(Some(&self.group_by.join(", ")), false)
            )
        }
    }

    fn build_where_clause(&self, sql: &mut String) {
        match self.where_clauses.as_slice() {
            [] => {}
            [single] => {
                sql.push_str(" WHERE ");
                sql.push_str(single);
            }
            clauses => {
                let wrapped: Vec<String> = clauses.iter().map(|c| format!("({})", c)).collect();
                sql.push_str(" WHERE ");
                sql.push_str(&wrapped.join(" AND "));
            }
        }
    }

    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            let columns: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| match direction {
                    OrderDirection::Asc => column.clone(),
                    OrderDirection::Desc => format!("{} DESC", column),
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&columns.join(", "));
        }

        if let Some((from, count)) = self.limit {
            sql.push_str(&self.dialect.pagination(from, count, !self.order_by.is_empty()));
        }
    }
}
