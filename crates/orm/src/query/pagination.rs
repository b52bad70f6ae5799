//! Query Builder pagination operations

use super::builder::QueryBuilder;

impl<'m> QueryBuilder<'m> {
    /// Skip `from` rows and return at most `count`
    pub fn limit(mut self, from: u64, count: u64) -> Self {
        self.limit = Some((from, count));
        self
    }

    /// One-based page of `per_page` rows
    pub fn paginate(self, per_page: u64, page: u64) -> Self {
        let from = page.saturating_sub(1).saturating_mul(per_page);
        self.limit(from, per_page)
    }
}
