//! Core DocHaus functionality
//!
//! This module contains the coordinator that owns the document store handle
//! for the lifetime of the process.

use mongodb::Client;
use mongodb::options::ClientOptions;
use std::sync::Arc;
use store_object::{DocumentStore, EntityStore, MongoStore, ValidatedCollectionName};

use crate::errors::DocHausError;
use crate::service::EntityService;
use config::{AppConfig, ServiceConfig};

const DEFAULT_APP_NAME: &str = "dochaus";

/// Main DocHaus coordinator that owns the store handle
#[derive(Debug, Clone)]
pub struct DocHaus {
    store: Arc<dyn DocumentStore>,
    service_config: ServiceConfig,
}

impl DocHaus {
    /// Connect to the configured database and verify it answers
    pub async fn connect(config: &AppConfig) -> Result<Self, DocHausError> {
        config.validate()?;
        let database = &config.database;

        let mut options = ClientOptions::parse(&database.uri).await?;
        options.app_name = Some(
            database
                .app_name
                .clone()
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        );
        options.min_pool_size = Some(database.min_pool_size);
        options.max_pool_size = Some(database.max_pool_size);
        options.connect_timeout = Some(database.connect_timeout());
        options.server_selection_timeout = Some(database.server_selection_timeout());

        let client = Client::with_options(options)?;
        let store = MongoStore::new(client, &database.database);
        store.ping().await?;

        tracing::info!(
            "[DOCHAUS] connected to database '{}' (pool {}..{})",
            database.database,
            database.min_pool_size,
            database.max_pool_size
        );

        Ok(Self::with_store(Arc::new(store), config.service.clone()))
    }

    /// Build a coordinator around an existing store handle
    pub fn with_store(store: Arc<dyn DocumentStore>, service_config: ServiceConfig) -> Self {
        Self {
            store,
            service_config,
        }
    }

    /// Get the shared store handle
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn service_config(&self) -> &ServiceConfig {
        &self.service_config
    }

    /// Entity executors for one collection
    pub fn entities(&self, entity_type: &str) -> Result<EntityStore, DocHausError> {
        let collection = ValidatedCollectionName::new(entity_type)?;
        Ok(EntityStore::new(Arc::clone(&self.store), collection))
    }

    /// The request-level service over this coordinator's store
    pub fn service(&self) -> EntityService {
        EntityService::new(
            Arc::clone(&self.store),
            self.service_config.request_timeout(),
        )
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), DocHausError> {
        self.store.ping().await?;
        Ok(())
    }

    /// Release the store handle
    pub async fn shutdown(self) -> Result<(), DocHausError> {
        self.store.shutdown().await?;
        debug_log!("[DOCHAUS] store shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store_object::MemoryStore;

    #[tokio::test]
    async fn test_entities_validates_entity_type() {
        let dochaus = DocHaus::with_store(Arc::new(MemoryStore::new()), ServiceConfig::default());
        assert!(dochaus.entities("users").is_ok());
        assert!(matches!(
            dochaus.entities("system.users"),
            Err(DocHausError::InvalidEntityType(_))
        ));
        assert!(dochaus.health_check().await.is_ok());
    }
}
