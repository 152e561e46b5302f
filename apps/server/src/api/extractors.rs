//! Custom Axum extractors.

use crate::Error;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::Value as JsonValue;

/// JSON object body. Unlike `axum::Json` it does not insist on a
/// `content-type` header, and every rejection renders as `VALIDATION_ERROR`.
pub struct JsonBody(pub JsonValue);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::Validation(format!("Failed to read request body: {e}")))?;

        if bytes.is_empty() {
            return Err(Error::Validation("Request body is empty".to_string()));
        }

        let value: JsonValue = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Validation(format!("Request body is not valid JSON: {e}")))?;

        if !value.is_object() {
            return Err(Error::Validation(
                "Request body must be a JSON object".to_string(),
            ));
        }
        Ok(JsonBody(value))
    }
}
