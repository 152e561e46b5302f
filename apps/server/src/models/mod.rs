//! FitTrack collections: list configuration, create payloads and derived fields

pub mod catalog;
pub mod derived;
pub mod payloads;

pub use catalog::{format_timestamp, Catalog, EntityKind, Relation};
pub use payloads::{prepare, GoalStatus, Prepared, WorkoutType};
