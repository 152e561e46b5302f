//! Combined filter + search conditions handed to the data layer.

use crate::filter::FilterQuery;
use crate::search::SearchQuery;
use serde::Serialize;

/// Conditions for one list query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Query {
    /// Matches every record.
    #[default]
    All,
    Filter(FilterQuery),
    Search(SearchQuery),
    /// Both the filter and the search must match.
    And(FilterQuery, SearchQuery),
}

impl Query {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn filter(&self) -> Option<&FilterQuery> {
        match self {
            Self::Filter(f) | Self::And(f, _) => Some(f),
            _ => None,
        }
    }

    pub fn search(&self) -> Option<&SearchQuery> {
        match self {
            Self::Search(s) | Self::And(_, s) => Some(s),
            _ => None,
        }
    }
}

/// Conjunction only when both sides constrain something.
pub fn combine_queries(filter: FilterQuery, search: SearchQuery) -> Query {
    match (filter.is_empty(), search.is_empty()) {
        (true, true) => Query::All,
        (false, true) => Query::Filter(filter),
        (true, false) => Query::Search(search),
        (false, false) => Query::And(filter, search),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Condition;
    use crate::search::build_search_query;

    fn filter() -> FilterQuery {
        FilterQuery::new().with("type", Condition::eq("strength"))
    }

    fn search() -> SearchQuery {
        build_search_query(Some("push"), &["name"])
    }

    #[test]
    fn one_sided_combinations_pass_through() {
        assert_eq!(
            combine_queries(filter(), SearchQuery::default()),
            Query::Filter(filter())
        );
        assert_eq!(
            combine_queries(FilterQuery::new(), search()),
            Query::Search(search())
        );
        assert!(combine_queries(FilterQuery::new(), SearchQuery::default()).is_all());
    }

    #[test]
    fn both_sides_are_conjoined() {
        let query = combine_queries(filter(), search());
        assert_eq!(query, Query::And(filter(), search()));
        assert_eq!(query.filter(), Some(&filter()));
        assert_eq!(query.search(), Some(&search()));
    }
}
