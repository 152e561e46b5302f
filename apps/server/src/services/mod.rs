//! Business logic between the HTTP handlers and the document stores

pub mod documents;
pub mod seed;

pub use documents::DocumentService;
pub use seed::{seed, SeedPlan, SeedReport};
