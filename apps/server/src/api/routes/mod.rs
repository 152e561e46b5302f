//! Route tables, nested by [`crate::api::create_router`]

pub mod documents;
pub mod metrics;
