//! Free-text search across a fixed set of fields.

use serde::Serialize;

/// One case-insensitive partial match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchClause {
    pub field: String,
    /// Matched literally, never as a pattern.
    pub term: String,
}

/// Disjunction of [`SearchClause`]s: a record matches when any clause does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchQuery {
    clauses: Vec<SearchClause>,
}

impl SearchQuery {
    pub fn clauses(&self) -> &[SearchClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Build the search clause set. Empty unless both a non-blank term and at least one
/// field are given.
pub fn build_search_query<S: AsRef<str>>(term: Option<&str>, fields: &[S]) -> SearchQuery {
    let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
        return SearchQuery::default();
    };

    SearchQuery {
        clauses: fields
            .iter()
            .map(|field| SearchClause {
                field: field.as_ref().to_string(),
                term: term.to_string(),
            })
            .collect(),
    }
}
