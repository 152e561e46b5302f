//! FitTrack API server
//!
//! REST endpoints over four document collections (users, goals, workouts,
//! exercises) with:
//! - list endpoints driven by `fittrack-query` (filters, search, sort, pages)
//! - relation population on list and read
//! - Postgres or in-memory document storage

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod request_context;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
