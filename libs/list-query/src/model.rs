//! Data-access abstraction the pagination processor drives.

use crate::query::Query;
use crate::sort::SortSpec;
use async_trait::async_trait;

/// A not-yet-executed fetch: conditions plus sort, populate steps and page window.
///
/// Builder methods consume `self`, so a handle that has been paginated can't be
/// reused in its pre-pagination form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    conditions: Query,
    sort: Option<SortSpec>,
    populate: Vec<String>,
    skip: u64,
    limit: Option<u64>,
}

impl FindQuery {
    pub fn new(conditions: Query) -> Self {
        Self {
            conditions,
            ..Self::default()
        }
    }

    pub fn sort(mut self, spec: SortSpec) -> Self {
        self.sort = Some(spec);
        self
    }

    /// Append one relation expansion. Steps run in the order they were added.
    pub fn populate(mut self, relation: impl Into<String>) -> Self {
        self.populate.push(relation.into());
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn conditions(&self) -> &Query {
        &self.conditions
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn relations(&self) -> &[String] {
        &self.populate
    }

    pub fn offset(&self) -> u64 {
        self.skip
    }

    pub fn max_results(&self) -> Option<u64> {
        self.limit
    }
}

/// A queryable collection of records.
#[async_trait]
pub trait Model: Send + Sync {
    type Record: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of records matching `query`, ignoring any page window.
    async fn count(&self, query: &Query) -> Result<u64, Self::Error>;

    /// Execute `find` and return the selected records in order.
    async fn find(&self, find: &FindQuery) -> Result<Vec<Self::Record>, Self::Error>;

    /// Count the conditions of `find` and execute it.
    ///
    /// The default issues both calls concurrently, so the total and the page may
    /// observe different states of the store. Implementations with snapshot reads
    /// should override this.
    async fn count_and_find(
        &self,
        find: &FindQuery,
    ) -> Result<(u64, Vec<Self::Record>), Self::Error> {
        futures::try_join!(self.count(find.conditions()), self.find(find))
    }
}
