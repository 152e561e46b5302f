//! One collection of a [`DocumentStore`] seen as a list-query [`Model`].

use super::traits::DocumentStore;
use crate::models::EntityKind;
use crate::{Error, Result};
use async_trait::async_trait;
use fittrack_query::{FindQuery, Model, Query};
use serde_json::Value as JsonValue;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn DocumentStore>,
    entity: EntityKind,
}

impl Collection {
    pub fn new(store: Arc<dyn DocumentStore>, entity: EntityKind) -> Self {
        Self { store, entity }
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }
}

#[async_trait]
impl Model for Collection {
    type Record = JsonValue;
    type Error = Error;

    async fn count(&self, query: &Query) -> Result<u64> {
        self.store.count(self.entity.collection(), query).await
    }

    async fn find(&self, find: &FindQuery) -> Result<Vec<JsonValue>> {
        let mut documents = self.store.find(self.entity.collection(), find).await?;
        populate(self.store.as_ref(), self.entity, &mut documents, find.relations()).await?;
        Ok(documents)
    }

    async fn count_and_find(&self, find: &FindQuery) -> Result<(u64, Vec<JsonValue>)> {
        let (total, mut documents) = self
            .store
            .count_and_find(self.entity.collection(), find)
            .await?;
        populate(self.store.as_ref(), self.entity, &mut documents, find.relations()).await?;
        Ok((total, documents))
    }
}

fn referenced_ids(document: &JsonValue, field: &str) -> Vec<Uuid> {
    match document.get(field) {
        Some(JsonValue::String(id)) => Uuid::parse_str(id).into_iter().collect(),
        Some(JsonValue::Array(ids)) => ids
            .iter()
            .filter_map(JsonValue::as_str)
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Replace reference ids in `documents` with the referenced documents.
///
/// Relations are expanded in the order given, one batched read each. A single
/// reference whose target is gone becomes `null`; missing entries of an array
/// reference are dropped. Names that are not relations of `entity` are skipped.
pub async fn populate(
    store: &dyn DocumentStore,
    entity: EntityKind,
    documents: &mut [JsonValue],
    relations: &[String],
) -> Result<()> {
    for name in relations {
        let Some(relation) = entity.relations().iter().find(|r| r.field == name.as_str()) else {
            tracing::warn!(collection = entity.collection(), relation = %name, "Unknown relation, not populated");
            continue;
        };

        let ids: BTreeSet<Uuid> = documents
            .iter()
            .flat_map(|doc| referenced_ids(doc, relation.field))
            .collect();
        if ids.is_empty() {
            continue;
        }
        let ids: Vec<Uuid> = ids.into_iter().collect();

        let targets: HashMap<String, JsonValue> = store
            .get_many(relation.target.collection(), &ids)
            .await?
            .into_iter()
            .filter_map(|body| {
                let id = body.get("id")?.as_str()?.to_string();
                Some((id, body))
            })
            .collect();

        for doc in documents.iter_mut() {
            let Some(value) = doc.get_mut(relation.field) else {
                continue;
            };
            *value = match &*value {
                JsonValue::String(id) if !relation.many => {
                    targets.get(id.as_str()).cloned().unwrap_or(JsonValue::Null)
                }
                JsonValue::Array(items) if relation.many => JsonValue::Array(
                    items
                        .iter()
                        .filter_map(|item| item.as_str().and_then(|id| targets.get(id)).cloned())
                        .collect(),
                ),
                _ => continue,
            };
        }
    }
    Ok(())
}
