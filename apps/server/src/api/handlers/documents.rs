//! List, read and create handlers shared by every collection

use crate::{api::extractors::JsonBody, services::DocumentService, state::AppState, Result};
use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    Json,
};
use fittrack_query::{ListRequest, ListResponse};
use serde_json::{json, Value as JsonValue};

/// `GET /api/:collection`
pub async fn list_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<ListResponse<JsonValue>>> {
    let entity = DocumentService::resolve(&collection)?;
    let request = ListRequest::from_query(query.as_deref().unwrap_or_default());
    let page = state.documents.list(entity, &request).await?;
    Ok(Json(page))
}

/// `GET /api/:collection/:id`
pub async fn get_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<JsonValue>> {
    let entity = DocumentService::resolve(&collection)?;
    let document = state.documents.get(entity, &id).await?;
    Ok(Json(json!({ "success": true, "data": document })))
}

/// `POST /api/:collection`
pub async fn create_document(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<JsonValue>)> {
    let entity = DocumentService::resolve(&collection)?;
    let document = state.documents.create(entity, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": document })),
    ))
}
