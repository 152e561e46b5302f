//! Sort specifications (`sort=name,-age`).

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(&self) -> bool {
        self.direction == SortDirection::Ascending
    }

    fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (field, direction) = match token.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Descending),
            None => (token, SortDirection::Ascending),
        };
        if !is_sort_field(field) {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => f.write_str(&self.field),
            SortDirection::Descending => write!(f, "-{}", self.field),
        }
    }
}

fn is_sort_field(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Ordered list of sort keys, rendered as space-separated tokens (`"name -age"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Strict parse for configuration values: every token must be a valid field.
    pub fn try_new(spec: &str) -> Result<Self> {
        let mut keys = Vec::new();
        for token in spec.split([',', ' ']).filter(|t| !t.trim().is_empty()) {
            let key = SortKey::parse(token).ok_or_else(|| Error::InvalidSortField(token.to_string()))?;
            keys.push(key);
        }
        Ok(Self { keys })
    }

    /// Lenient parse for client input: blank or malformed tokens are skipped.
    fn from_request(raw: &str) -> Self {
        Self {
            keys: raw.split(',').filter_map(SortKey::parse).collect(),
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Resolve the request's `sort` parameter. Absent, blank or entirely malformed input
/// yields `default`.
pub fn parse_sort_query(sort: Option<&str>, default: &SortSpec) -> SortSpec {
    match sort.map(SortSpec::from_request) {
        Some(spec) if !spec.is_empty() => spec,
        _ => default.clone(),
    }
}
