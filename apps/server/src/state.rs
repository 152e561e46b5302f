//! Shared application state handed to every handler.

use crate::config::{Config, StoreBackend};
use crate::db::{DocumentStore, MemoryDocumentStore, PostgresDocumentStore};
use crate::models::Catalog;
use crate::services::DocumentService;
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub catalog: Arc<Catalog>,
    pub documents: Arc<DocumentService>,
}

impl AppState {
    /// Open the configured backend and build the services on top of it.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let catalog = Catalog::new(&config.listing).context("Invalid listing configuration")?;

        let store: Arc<dyn DocumentStore> = match config.database.backend {
            StoreBackend::Postgres => {
                let store = PostgresDocumentStore::connect(&config.database).await?;
                if config.database.run_migrations {
                    store.migrate().await?;
                    tracing::info!("Database migrations applied");
                }
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Arc::new(MemoryDocumentStore::with_unique_fields(catalog.unique_fields()))
            }
        };

        Ok(Self::assemble(config, store, catalog))
    }

    /// Build state over an existing store.
    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let catalog = Catalog::new(&config.listing).context("Invalid listing configuration")?;
        Ok(Self::assemble(config, store, catalog))
    }

    fn assemble(config: Config, store: Arc<dyn DocumentStore>, catalog: Catalog) -> Self {
        let catalog = Arc::new(catalog);
        let documents = Arc::new(DocumentService::new(store.clone(), catalog.clone()));
        Self {
            config: Arc::new(config),
            store,
            catalog,
            documents,
        }
    }
}
