//! Collection routes
//!
//! Both `/users` and `/users/` are accepted; no redirects.

use crate::api::handlers::documents;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:collection",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/:collection/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/:collection/:id", get(documents::get_document))
}
