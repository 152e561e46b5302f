//! Storage trait for FitTrack documents

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fittrack_query::{FindQuery, Query};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A validated document ready to be stored. `body` already carries `id` and
/// `createdAt`.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub body: JsonValue,
}

/// Storage backend for JSON documents grouped into collections.
///
/// Backends evaluate [`Query`] conditions against document bodies. Text equality
/// compares the value's text form, so `age=30` matches both `30` and `"30"`.
/// Relation population is not the store's concern; see
/// [`crate::db::collection::Collection`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for health output and logs.
    fn backend(&self) -> &'static str;

    /// Count documents in `collection` matching `query`.
    async fn count(&self, collection: &str, query: &Query) -> Result<u64>;

    /// Execute `find` (conditions, sort, page window) against `collection`.
    ///
    /// # Returns
    /// Document bodies in sort order. Ties are broken by id.
    async fn find(&self, collection: &str, find: &FindQuery) -> Result<Vec<JsonValue>>;

    /// Count the conditions of `find` and fetch its page.
    ///
    /// The default runs both concurrently with no consistency guarantee between
    /// them. Backends that can read from one snapshot override it.
    async fn count_and_find(
        &self,
        collection: &str,
        find: &FindQuery,
    ) -> Result<(u64, Vec<JsonValue>)> {
        futures::try_join!(
            self.count(collection, find.conditions()),
            self.find(collection, find)
        )
    }

    /// Read one document.
    ///
    /// # Returns
    /// * `Ok(Some(body))` - Document found
    /// * `Ok(None)` - No document with that id in `collection`
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>>;

    /// Load several documents in one round trip. Missing ids are skipped and
    /// the result order is unspecified.
    async fn get_many(&self, collection: &str, ids: &[Uuid]) -> Result<Vec<JsonValue>>;

    /// Store a new document.
    ///
    /// # Errors
    /// * `DuplicateKey` - A unique field of the collection already holds this value
    async fn insert(&self, collection: &str, document: NewDocument) -> Result<JsonValue>;

    /// Delete every document in `collection`, returning how many were removed.
    async fn clear(&self, collection: &str) -> Result<u64>;
}
