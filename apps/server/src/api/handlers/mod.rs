//! Request handlers for API endpoints
//!
//! Handlers extract path, query and body, call the document service and wrap
//! the result. Errors render through [`crate::Error`]'s `IntoResponse`.

pub mod documents;
pub mod metrics;

pub use documents::*;
pub use metrics::*;
