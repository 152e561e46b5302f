//! Page bounds and the count + fetch cycle.
//!
//! Pages are 1-based. `startIndex = (page - 1) * limit`, `endIndex = page * limit`.
//! `next` exists iff `endIndex < total`, `prev` iff `startIndex > 0`.

use crate::model::{FindQuery, Model};
use crate::query::Query;
use crate::request::ListRequest;
use crate::response::ListResponse;
use crate::sort::SortSpec;
use crate::DEFAULT_LIMIT;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page: u64,
    pub limit: u64,
}

/// Pagination envelope. The optional fields are only known once the total is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub start_index: u64,
    pub end_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
}

impl Pagination {
    /// Bounds for `page` of size `limit`. Zero is raised to 1 for both.
    pub fn new(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            start_index: (page - 1).saturating_mul(limit),
            end_index: page.saturating_mul(limit),
            next: None,
            prev: None,
            total: None,
            pages: None,
        }
    }

    /// Fill in `next`, `prev`, `total` and `pages` for `total` matching records.
    pub fn with_total(mut self, total: u64) -> Self {
        self.next = (self.end_index < total).then(|| PageLink {
            page: self.page + 1,
            limit: self.limit,
        });
        self.prev = (self.start_index > 0).then(|| PageLink {
            page: self.page.saturating_sub(1).max(1),
            limit: self.limit,
        });
        self.total = Some(total);
        self.pages = Some(total.div_ceil(self.limit.max(1)));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    pub default_limit: u64,
    pub max_limit: Option<u64>,
    /// Known total; when set the envelope carries `next`, `prev`, `total` and `pages`.
    pub total_docs: Option<u64>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
            total_docs: None,
        }
    }
}

pub(crate) fn resolve_page(requested: Option<i64>) -> u64 {
    match requested {
        Some(page) if page >= 1 => page as u64,
        _ => 1,
    }
}

pub(crate) fn resolve_limit(requested: Option<i64>, default_limit: u64, max_limit: Option<u64>) -> u64 {
    let default_limit = default_limit.max(1);
    let limit = match requested {
        Some(limit) if limit >= 1 => limit as u64,
        _ => default_limit,
    };
    match max_limit {
        Some(max) if max >= 1 => limit.min(max),
        _ => limit,
    }
}

/// Read `page` and `limit` from the request and compute the envelope.
///
/// Missing, non-numeric and non-positive values fall back to page 1 and the
/// default limit.
pub fn get_pagination(request: &ListRequest, options: &PaginationOptions) -> Pagination {
    let page = resolve_page(request.page());
    let limit = resolve_limit(request.limit(), options.default_limit, options.max_limit);
    let pagination = Pagination::new(page, limit);
    match options.total_docs {
        Some(total) => pagination.with_total(total),
        None => pagination,
    }
}

/// Restrict `find` to the page window described by `pagination`.
pub fn apply_pagination(find: FindQuery, pagination: &Pagination) -> FindQuery {
    find.skip(pagination.start_index).limit(pagination.limit)
}

#[derive(Debug, Clone, Default)]
pub struct PaginateOptions {
    pub pagination: PaginationOptions,
    pub sort: Option<SortSpec>,
    /// Relation names, expanded in order.
    pub populate: Vec<String>,
}

impl PaginateOptions {
    pub fn new(pagination: PaginationOptions) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }

    pub fn sort(mut self, spec: SortSpec) -> Self {
        self.sort = Some(spec);
        self
    }

    pub fn populate<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.populate.extend(relations.into_iter().map(Into::into));
        self
    }
}

/// Count, fetch one page and wrap it in the list envelope.
///
/// Store errors are logged and returned unchanged.
pub async fn paginate_results<M: Model>(
    request: &ListRequest,
    model: &M,
    conditions: &Query,
    options: &PaginateOptions,
) -> Result<ListResponse<M::Record>, M::Error> {
    let pagination = get_pagination(
        request,
        &PaginationOptions {
            total_docs: None,
            ..options.pagination
        },
    );

    let mut find = FindQuery::new(conditions.clone());
    if let Some(sort) = &options.sort {
        find = find.sort(sort.clone());
    }
    for relation in &options.populate {
        find = find.populate(relation.clone());
    }
    let find = apply_pagination(find, &pagination);

    let (total, records) = match model.count_and_find(&find).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, page = pagination.page, limit = pagination.limit, "Paginated fetch failed");
            return Err(e);
        }
    };

    tracing::debug!(
        total,
        page = pagination.page,
        limit = pagination.limit,
        returned = records.len(),
        "Paginated fetch complete"
    );

    Ok(ListResponse::new(pagination.with_total(total), records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_total(query: &str, total: u64) -> Pagination {
        get_pagination(
            &ListRequest::from_query(query),
            &PaginationOptions {
                total_docs: Some(total),
                ..PaginationOptions::default()
            },
        )
    }

    #[test]
    fn first_page_has_next_only() {
        let p = with_total("page=1&limit=10", 25);
        assert_eq!(p.next, Some(PageLink { page: 2, limit: 10 }));
        assert_eq!(p.prev, None);
        assert_eq!(p.pages, Some(3));
    }

    #[test]
    fn last_page_has_prev_only() {
        let p = with_total("page=3&limit=10", 25);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageLink { page: 2, limit: 10 }));
        assert_eq!((p.start_index, p.end_index), (20, 30));
    }

    #[test]
    fn missing_params_use_defaults() {
        let p = get_pagination(&ListRequest::default(), &PaginationOptions::default());
        assert_eq!((p.page, p.limit, p.start_index, p.end_index), (1, 10, 0, 10));
        assert_eq!(p.total, None);

        let p = get_pagination(
            &ListRequest::default(),
            &PaginationOptions {
                default_limit: 25,
                ..PaginationOptions::default()
            },
        );
        assert_eq!(p.limit, 25);
    }

    #[test]
    fn non_positive_values_are_clamped() {
        let p = get_pagination(
            &ListRequest::from_query("page=-1&limit=0"),
            &PaginationOptions::default(),
        );
        assert_eq!((p.page, p.limit, p.start_index), (1, 10, 0));

        let p = get_pagination(&ListRequest::from_query("page=0&limit=x"), &PaginationOptions::default());
        assert_eq!((p.page, p.limit), (1, 10));
    }

    #[test]
    fn limit_is_capped() {
        let p = get_pagination(
            &ListRequest::from_query("limit=1000"),
            &PaginationOptions {
                max_limit: Some(100),
                ..PaginationOptions::default()
            },
        );
        assert_eq!(p.limit, 100);
    }

    #[test]
    fn empty_result_set() {
        let p = with_total("", 0);
        assert_eq!(p.pages, Some(0));
        assert_eq!(p.next, None);
        assert_eq!(p.prev, None);
    }

    #[test]
    fn page_past_the_end_keeps_prev() {
        let p = with_total("page=9&limit=10", 25);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageLink { page: 8, limit: 10 }));
    }

    #[test]
    fn serializes_in_camel_case_without_unknowns() {
        let p = get_pagination(&ListRequest::default(), &PaginationOptions::default());
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            serde_json::json!({"page": 1, "limit": 10, "startIndex": 0, "endIndex": 10})
        );
    }

    #[test]
    fn zero_page_and_limit_are_raised_to_one() {
        let p = Pagination::new(0, 0).with_total(3);
        assert_eq!((p.page, p.limit, p.start_index, p.end_index), (1, 1, 0, 1));
        assert_eq!(p.pages, Some(3));
        assert_eq!(p.prev, None);
    }

    #[test]
    fn with_total_tolerates_hand_built_zero_limit() {
        let p = Pagination {
            limit: 0,
            ..Pagination::new(2, 5)
        }
        .with_total(12);
        assert_eq!(p.pages, Some(12));
        assert_eq!(p.prev, Some(PageLink { page: 1, limit: 0 }));
    }

    #[test]
    fn apply_sets_window() {
        let p = Pagination::new(3, 5);
        let find = apply_pagination(FindQuery::new(Query::All), &p);
        assert_eq!((find.offset(), find.max_results()), (10, Some(5)));
    }
}
