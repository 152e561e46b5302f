//! Request → `{query, sort, page, limit}` orchestration.

use crate::error::{Error, Result};
use crate::filter::{build_filter_query, AllowedFilters, FilterTransform, SpecialFilters};
use crate::pagination::{resolve_limit, resolve_page};
use crate::query::{combine_queries, Query};
use crate::request::ListRequest;
use crate::search::build_search_query;
use crate::sort::{parse_sort_query, SortSpec};
use crate::{DEFAULT_LIMIT, DEFAULT_SORT};

/// Per-endpoint list configuration.
#[derive(Debug, Clone)]
pub struct ListQueryOptions {
    pub allowed_filters: AllowedFilters,
    pub special_filters: SpecialFilters,
    pub search_fields: Vec<String>,
    pub default_sort: SortSpec,
    pub default_limit: u64,
    /// Upper bound for client-requested page sizes; `None` leaves them unbounded.
    pub max_limit: Option<u64>,
}

impl Default for ListQueryOptions {
    fn default() -> Self {
        Self {
            allowed_filters: AllowedFilters::default(),
            special_filters: SpecialFilters::default(),
            search_fields: Vec::new(),
            default_sort: SortSpec::try_new(DEFAULT_SORT).unwrap_or_default(),
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }
}

impl ListQueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow<I, S>(mut self, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_filters = AllowedFilters::new(fields)?;
        Ok(self)
    }

    pub fn special<T>(mut self, name: &str, transform: T) -> Result<Self>
    where
        T: FilterTransform + 'static,
    {
        self.special_filters.register(name, transform)?;
        Ok(self)
    }

    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_sort(mut self, spec: &str) -> Result<Self> {
        self.default_sort = SortSpec::try_new(spec)?;
        Ok(self)
    }

    pub fn limits(mut self, default_limit: u64, max_limit: Option<u64>) -> Result<Self> {
        if default_limit == 0 || max_limit == Some(0) {
            return Err(Error::ZeroLimit);
        }
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        Ok(self)
    }
}

/// Shaped list query, ready for [`crate::paginate_results`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedQuery {
    pub query: Query,
    pub sort: SortSpec,
    pub page: u64,
    pub limit: u64,
}

/// Build filter, search, sort and page bounds for one request.
pub fn process_query(request: &ListRequest, options: &ListQueryOptions) -> ProcessedQuery {
    let filter = build_filter_query(
        request.params(),
        &options.allowed_filters,
        &options.special_filters,
    );
    let search = build_search_query(request.search(), &options.search_fields);

    ProcessedQuery {
        query: combine_queries(filter, search),
        sort: parse_sort_query(request.sort(), &options.default_sort),
        page: resolve_page(request.page()),
        limit: resolve_limit(request.limit(), options.default_limit, options.max_limit),
    }
}
