//! List-query shaping for FitTrack endpoints
//!
//! Turns raw HTTP query-string parameters into a typed, allow-listed query and
//! drives a count + fetch cycle against any [`Model`]:
//! - [`process_query`] builds the filter, free-text search and sort for a request
//! - [`paginate_results`] counts, fetches one page and wraps it in a [`ListResponse`]
//!
//! Malformed or unknown client input never fails a request here: unknown filters are
//! dropped and bad page/limit values fall back to defaults. Only the data layer can fail.

#![forbid(unsafe_code)]

mod error;
pub mod filter;
pub mod model;
pub mod pagination;
pub mod process;
pub mod query;
pub mod request;
pub mod response;
pub mod search;
pub mod sort;

pub use error::{Error, Result};
pub use filter::{
    build_filter_query, AllowedFilters, Bound, Condition, FilterQuery, FilterTransform, RangeOp,
    SpecialFilters,
};
pub use model::{FindQuery, Model};
pub use pagination::{
    apply_pagination, get_pagination, paginate_results, PageLink, PaginateOptions, Pagination,
    PaginationOptions,
};
pub use process::{process_query, ListQueryOptions, ProcessedQuery};
pub use query::{combine_queries, Query};
pub use request::{ListRequest, RESERVED_PARAMS};
pub use response::ListResponse;
pub use search::{build_search_query, SearchClause, SearchQuery};
pub use sort::{parse_sort_query, SortDirection, SortKey, SortSpec};

/// Page size used when neither the request nor the endpoint supplies one.
pub const DEFAULT_LIMIT: u64 = 10;

/// Sort applied when a request carries no `sort` parameter: newest first.
pub const DEFAULT_SORT: &str = "-createdAt";
