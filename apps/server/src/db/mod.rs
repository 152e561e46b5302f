//! Database layer - document stores and the list-query bridge

pub mod collection;
pub mod memory;
pub mod postgres;
pub mod sql;
pub mod traits;

pub use collection::{populate, Collection};
pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use traits::{DocumentStore, NewDocument};
