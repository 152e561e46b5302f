//! Error types for the FitTrack API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Duplicate value for field '{field}'")]
    DuplicateKey { field: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("List query configuration error: {0}")]
    Query(#[from] fittrack_query::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Postgres SQLSTATE codes with a client-facing meaning.
const UNIQUE_VIOLATION: &str = "23505";
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    let field = db
                        .constraint()
                        .map(field_from_constraint)
                        .unwrap_or_else(|| "unknown".to_string());
                    return Error::DuplicateKey { field };
                }
                Some(INVALID_TEXT_REPRESENTATION) => {
                    return Error::InvalidId(db.message().to_string());
                }
                _ => {}
            }
        }
        Error::Database(e)
    }
}

/// Unique indexes are named `documents_<collection>_<field>_key`.
fn field_from_constraint(constraint: &str) -> String {
    constraint
        .strip_suffix("_key")
        .and_then(|rest| rest.rsplit('_').next())
        .filter(|field| !field.is_empty())
        .unwrap_or(constraint)
        .to_string()
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::InvalidId(_) => "INVALID_ID",
            Error::DuplicateKey { .. } => "DUPLICATE_KEY",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Database(_) | Error::Query(_) | Error::Internal(_) | Error::Other(_) => {
                "SERVER_ERROR"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidId(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateKey { .. } => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Query(_) | Error::Internal(_) | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Internal error");
            "Server Error".to_string()
        } else {
            self.to_string()
        };

        // Only debug builds carry a stack.
        let stack = cfg!(debug_assertions).then(|| format!("{self:?}"));

        let mut error = json!({
            "code": self.code(),
            "message": message,
            "stack": stack,
        });
        if let Error::DuplicateKey { field } = &self {
            error["field"] = json!(field);
        }

        (status, Json(json!({ "success": false, "error": error }))).into_response()
    }
}
