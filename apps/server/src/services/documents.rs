//! Document service - list, read and create for every collection
//!
//! Lists go through the list-query pipeline:
//! - `process_query` turns the request into filter, search, sort and page bounds
//! - `paginate_results` counts and fetches one page through a [`Collection`]
//! - relations are populated on every returned document

use crate::db::{populate, Collection, DocumentStore, NewDocument};
use crate::metrics::{
    DOCUMENTS_CREATED_TOTAL, LIST_PAGE_SIZE, LIST_QUERIES_TOTAL, STORE_ERRORS_TOTAL,
};
use crate::models::{format_timestamp, prepare, Catalog, EntityKind};
use crate::{Error, Result};
use chrono::Utc;
use fittrack_query::{paginate_results, process_query, ListRequest, ListResponse, PaginateOptions};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use uuid::Uuid;

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<Catalog>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Map a path segment to a collection; unknown names are `NOT_FOUND`.
    pub fn resolve(collection: &str) -> Result<EntityKind> {
        EntityKind::from_collection(collection)
            .ok_or_else(|| Error::NotFound(format!("Unknown collection '{collection}'")))
    }

    fn relation_names(entity: EntityKind) -> Vec<String> {
        entity
            .relations()
            .iter()
            .map(|relation| relation.field.to_string())
            .collect()
    }

    /// One page of `entity`, filtered, searched and sorted per `request`.
    pub async fn list(
        &self,
        entity: EntityKind,
        request: &ListRequest,
    ) -> Result<ListResponse<JsonValue>> {
        let collection = entity.collection();
        let processed = process_query(request, self.catalog.list_options(entity));
        tracing::debug!(
            collection,
            query = ?processed.query,
            sort = %processed.sort,
            page = processed.page,
            limit = processed.limit,
            "Processed list query"
        );

        let options = PaginateOptions::new(self.catalog.pagination())
            .sort(processed.sort)
            .populate(Self::relation_names(entity));
        let model = Collection::new(self.store.clone(), entity);

        let result = paginate_results(request, &model, &processed.query, &options).await;
        match &result {
            Ok(response) => {
                LIST_QUERIES_TOTAL
                    .with_label_values(&[collection, "ok"])
                    .inc();
                LIST_PAGE_SIZE
                    .with_label_values(&[collection])
                    .observe(response.count as f64);
            }
            Err(e) => {
                LIST_QUERIES_TOTAL
                    .with_label_values(&[collection, "error"])
                    .inc();
                STORE_ERRORS_TOTAL
                    .with_label_values(&["list", e.code()])
                    .inc();
            }
        }
        result
    }

    /// One document with its relations populated.
    pub async fn get(&self, entity: EntityKind, id: &str) -> Result<JsonValue> {
        let uuid = Uuid::parse_str(id).map_err(|_| Error::InvalidId(id.to_string()))?;
        let document = self
            .store
            .get(entity.collection(), uuid)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No {} document with id {id}", entity.collection())))?;

        let mut documents = [document];
        populate(
            self.store.as_ref(),
            entity,
            &mut documents,
            &Self::relation_names(entity),
        )
        .await?;
        let [document] = documents;
        Ok(document)
    }

    /// Validate `body`, derive computed fields and store it.
    ///
    /// # Errors
    /// * `Validation` - Malformed payload or a reference to a missing document
    /// * `DuplicateKey` - A unique field is already taken
    pub async fn create(&self, entity: EntityKind, body: JsonValue) -> Result<JsonValue> {
        let prepared = prepare(entity, body)?;
        self.check_references(&prepared.references).await?;

        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let mut document = Map::new();
        document.insert("id".to_string(), json!(id));
        if let JsonValue::Object(fields) = prepared.body {
            document.extend(fields);
        }
        document.insert("createdAt".to_string(), json!(format_timestamp(created_at)));

        let stored = self
            .store
            .insert(
                entity.collection(),
                NewDocument {
                    id,
                    created_at,
                    body: JsonValue::Object(document),
                },
            )
            .await
            .inspect_err(|e| {
                STORE_ERRORS_TOTAL
                    .with_label_values(&["insert", e.code()])
                    .inc();
            })?;

        DOCUMENTS_CREATED_TOTAL
            .with_label_values(&[entity.collection()])
            .inc();
        tracing::info!(collection = entity.collection(), %id, "Document created");
        Ok(stored)
    }

    async fn check_references(&self, references: &[(EntityKind, Uuid)]) -> Result<()> {
        let mut wanted: BTreeMap<&'static str, BTreeSet<Uuid>> = BTreeMap::new();
        for (entity, id) in references {
            wanted.entry(entity.collection()).or_default().insert(*id);
        }

        for (collection, ids) in wanted {
            let ids: Vec<Uuid> = ids.into_iter().collect();
            let found: HashSet<String> = self
                .store
                .get_many(collection, &ids)
                .await?
                .iter()
                .filter_map(|body| body.get("id").and_then(JsonValue::as_str))
                .map(str::to_string)
                .collect();
            if let Some(missing) = ids.iter().find(|id| !found.contains(&id.to_string())) {
                return Err(Error::Validation(format!(
                    "Referenced {collection} document {missing} does not exist"
                )));
            }
        }
        Ok(())
    }

    /// Remove every document of `entity`.
    pub async fn clear(&self, entity: EntityKind) -> Result<u64> {
        let removed = self.store.clear(entity.collection()).await?;
        tracing::info!(collection = entity.collection(), removed, "Collection cleared");
        Ok(removed)
    }
}
