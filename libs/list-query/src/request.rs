//! Raw list-request parameters as received from the HTTP layer.

/// Query parameters with a fixed meaning that are never treated as filters.
pub const RESERVED_PARAMS: [&str; 5] = ["page", "sort", "limit", "fields", "search"];

pub(crate) fn is_reserved(key: &str) -> bool {
    RESERVED_PARAMS.contains(&key)
}

/// One list request's query string, kept in request order.
///
/// Repeated reserved parameters resolve to their last occurrence, matching how the
/// HTTP layer collapses them into a single-valued map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    params: Vec<(String, String)>,
}

impl ListRequest {
    /// Parse an `application/x-www-form-urlencoded` query string (without the `?`).
    pub fn from_query(query: &str) -> Self {
        let params = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self { params }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Every raw parameter, reserved ones included.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn last(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Free-text search term, `None` when absent or blank.
    pub fn search(&self) -> Option<&str> {
        self.last("search")
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn sort(&self) -> Option<&str> {
        self.last("sort")
    }

    /// Reserved for projections; carried but not applied.
    pub fn fields(&self) -> Option<&str> {
        self.last("fields")
    }

    /// Requested page, `None` when absent or not an integer.
    pub fn page(&self) -> Option<i64> {
        self.last("page").and_then(parse_integer)
    }

    /// Requested page size, `None` when absent or not an integer.
    pub fn limit(&self) -> Option<i64> {
        self.last("limit").and_then(parse_integer)
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
