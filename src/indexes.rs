//! Index bootstrap
//!
//! Creates the indexes listed in configuration before the service starts
//! taking requests.

use crate::core::DocHaus;
use crate::errors::DocHausError;
use config::{IndexConfig, IndexOrder};
use store_object::{IndexKind, IndexSpec, ValidatedCollectionName};

fn index_kind(order: IndexOrder) -> IndexKind {
    match order {
        IndexOrder::Asc => IndexKind::Ascending,
        IndexOrder::Desc => IndexKind::Descending,
        IndexOrder::Text => IndexKind::Text,
    }
}

/// Store-level index description for one configured index
pub fn index_spec(config: &IndexConfig) -> IndexSpec {
    IndexSpec {
        keys: config
            .keys
            .iter()
            .map(|key| (key.field.clone(), index_kind(key.order)))
            .collect(),
        unique: config.unique,
        name: config.name.clone(),
    }
}

impl DocHaus {
    /// Create every configured index; existing identical indexes are left alone
    ///
    /// Returns the index names in configuration order.
    pub async fn ensure_indexes(&self, indexes: &[IndexConfig]) -> Result<Vec<String>, DocHausError> {
        let mut names = Vec::with_capacity(indexes.len());

        for index in indexes {
            let collection = ValidatedCollectionName::new(&index.collection)?;
            let name = self
                .store()
                .create_index(&collection, index_spec(index))
                .await
                .map_err(|source| DocHausError::IndexCreation {
                    collection: index.collection.clone(),
                    source,
                })?;

            tracing::info!("[INDEX] {} ready on '{}'", name, index.collection);
            names.push(name);
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{IndexKeyConfig, ServiceConfig};
    use std::sync::Arc;
    use store_object::MemoryStore;

    fn email_index() -> IndexConfig {
        IndexConfig {
            collection: "users".to_string(),
            keys: vec![IndexKeyConfig {
                field: "email".to_string(),
                order: IndexOrder::Asc,
            }],
            unique: true,
            name: None,
        }
    }

    #[test]
    fn test_index_spec_mapping() {
        let spec = index_spec(&email_index());
        assert_eq!(spec.keys, vec![("email".to_string(), IndexKind::Ascending)]);
        assert!(spec.unique);
    }

    #[tokio::test]
    async fn test_ensure_indexes_is_idempotent() {
        let dochaus = DocHaus::with_store(Arc::new(MemoryStore::new()), ServiceConfig::default());
        let first = dochaus.ensure_indexes(&[email_index()]).await.unwrap();
        let second = dochaus.ensure_indexes(&[email_index()]).await.unwrap();
        assert_eq!(first, vec!["email_1".to_string()]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ensure_indexes_rejects_bad_collection() {
        let dochaus = DocHaus::with_store(Arc::new(MemoryStore::new()), ServiceConfig::default());
        let mut index = email_index();
        index.collection = "system.users".to_string();
        assert!(matches!(
            dochaus.ensure_indexes(&[index]).await,
            Err(DocHausError::InvalidEntityType(_))
        ));
    }
}
