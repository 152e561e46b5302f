//! In-process document store.
//!
//! Evaluates queries with the same rules the SQL compiler encodes: equality by value
//! for numbers and by text form otherwise, numeric bounds only against numbers,
//! case-insensitive literal `Contains`, and Postgres' JSONB ordering for sorts. Used for tests and
//! for running the API without a database.

use super::sql::{json_text, numeric_literal};
use super::traits::{DocumentStore, NewDocument};
use crate::{Error, Result};
use async_trait::async_trait;
use fittrack_query::{Condition, FindQuery, Query, RangeOp};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredDocument {
    id: Uuid,
    body: JsonValue,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
    /// Case-insensitively unique fields per collection.
    unique_fields: HashMap<String, Vec<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique_fields<I, C, F>(unique_fields: I) -> Self
    where
        I: IntoIterator<Item = (C, Vec<F>)>,
        C: Into<String>,
        F: Into<String>,
    {
        Self {
            collections: RwLock::default(),
            unique_fields: unique_fields
                .into_iter()
                .map(|(c, fields)| (c.into(), fields.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }
}

fn field_value<'a>(body: &'a JsonValue, field: &str) -> Option<&'a JsonValue> {
    field
        .split('.')
        .try_fold(body, |value, segment| value.get(segment))
}

fn field_text(body: &JsonValue, field: &str) -> Option<String> {
    field_value(body, field).and_then(json_text)
}

fn matches_query(body: &JsonValue, query: &Query) -> bool {
    let filter_ok = query.filter().map_or(true, |filter| {
        filter
            .iter()
            .all(|(field, condition)| matches_condition(body, field, condition))
    });
    let search_ok = query.search().map_or(true, |search| {
        search
            .clauses()
            .iter()
            .any(|clause| contains(body, &clause.field, &clause.term))
    });
    filter_ok && search_ok
}

fn matches_condition(body: &JsonValue, field: &str, condition: &Condition) -> bool {
    match condition {
        Condition::Eq(value) => equals(body, field, value),
        Condition::Ne(value) => !equals(body, field, value),
        Condition::In(values) => values
            .iter()
            .filter(|value| !value.is_null())
            .any(|value| equals(body, field, value)),
        Condition::Range(bounds) => bounds
            .iter()
            .all(|bound| within(body, field, bound.op, &bound.value)),
        Condition::Contains(term) => contains(body, field, term),
    }
}

fn equals(body: &JsonValue, field: &str, expected: &JsonValue) -> bool {
    let actual = field_value(body, field);
    if let (Some(JsonValue::Number(n)), Some(expected)) = (actual, numeric_literal(expected)) {
        return n.as_f64() == Some(expected);
    }
    actual.and_then(json_text) == json_text(expected)
}

fn within(body: &JsonValue, field: &str, op: RangeOp, bound: &JsonValue) -> bool {
    let ordering = if bound.is_number() {
        match (field_value(body, field).and_then(JsonValue::as_f64), bound.as_f64()) {
            (Some(actual), Some(bound)) => actual.partial_cmp(&bound),
            _ => None,
        }
    } else {
        match (field_text(body, field), json_text(bound)) {
            (Some(actual), Some(bound)) => Some(actual.cmp(&bound)),
            _ => None,
        }
    };

    match (ordering, op) {
        (Some(o), RangeOp::Gt) => o == Ordering::Greater,
        (Some(o), RangeOp::Gte) => o != Ordering::Less,
        (Some(o), RangeOp::Lt) => o == Ordering::Less,
        (Some(o), RangeOp::Lte) => o != Ordering::Greater,
        (None, _) => false,
    }
}

fn contains(body: &JsonValue, field: &str, term: &str) -> bool {
    field_text(body, field)
        .map(|text| text.to_lowercase().contains(&term.to_lowercase()))
        .unwrap_or(false)
}

/// JSONB type order: null < string < number < boolean < array < object.
fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::String(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::Bool(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

/// Ascending order of one sort key. Missing fields sort after everything, like SQL
/// NULLs under `ASC`.
fn compare_field(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
            (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
            (JsonValue::Number(x), JsonValue::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
            _ => a.to_string().cmp(&b.to_string()),
        }),
    }
}

fn select(documents: &[StoredDocument], find: &FindQuery) -> Vec<JsonValue> {
    let mut selected: Vec<&StoredDocument> = documents
        .iter()
        .filter(|doc| matches_query(&doc.body, find.conditions()))
        .collect();

    selected.sort_by(|a, b| {
        let keys = find.sort_spec().map(|s| s.keys()).unwrap_or_default();
        keys.iter()
            .map(|key| {
                let ordering = compare_field(
                    field_value(&a.body, &key.field),
                    field_value(&b.body, &key.field),
                );
                if key.ascending() {
                    ordering
                } else {
                    ordering.reverse()
                }
            })
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    });

    let limit = find.max_results().map_or(usize::MAX, |l| l as usize);
    selected
        .into_iter()
        .skip(find.offset() as usize)
        .take(limit)
        .map(|doc| doc.body.clone())
        .collect()
}

fn count(documents: &[StoredDocument], query: &Query) -> u64 {
    documents
        .iter()
        .filter(|doc| matches_query(&doc.body, query))
        .count() as u64
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map_or(0, |docs| count(docs, query)))
    }

    async fn find(&self, collection: &str, find: &FindQuery) -> Result<Vec<JsonValue>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| select(docs, find))
            .unwrap_or_default())
    }

    /// Count and page are taken under one read lock.
    async fn count_and_find(
        &self,
        collection: &str,
        find: &FindQuery,
    ) -> Result<(u64, Vec<JsonValue>)> {
        let collections = self.collections.read().await;
        Ok(match collections.get(collection) {
            Some(docs) => (count(docs, find.conditions()), select(docs, find)),
            None => (0, Vec::new()),
        })
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .map(|doc| doc.body.clone()))
    }

    async fn get_many(&self, collection: &str, ids: &[Uuid]) -> Result<Vec<JsonValue>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| ids.contains(&doc.id))
                    .map(|doc| doc.body.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, document: NewDocument) -> Result<JsonValue> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.iter().any(|doc| doc.id == document.id) {
            return Err(Error::DuplicateKey {
                field: "id".to_string(),
            });
        }
        for field in self.unique_fields.get(collection).into_iter().flatten() {
            let Some(value) = field_text(&document.body, field).map(|v| v.to_lowercase()) else {
                continue;
            };
            let taken = docs
                .iter()
                .any(|doc| field_text(&doc.body, field).map(|v| v.to_lowercase()) == Some(value.clone()));
            if taken {
                return Err(Error::DuplicateKey {
                    field: field.clone(),
                });
            }
        }

        docs.push(StoredDocument {
            id: document.id,
            body: document.body.clone(),
        });
        Ok(document.body)
    }

    async fn clear(&self, collection: &str) -> Result<u64> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .remove(collection)
            .map_or(0, |docs| docs.len() as u64))
    }
}
