// FICHIER : src-server/src/json_db/storage/mod.rs

pub mod cache;
pub mod file_storage;

use crate::json_db::transactions::lock_manager::LockManager;
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Capacité du cache LRU partagé (documents).
pub const CACHE_CAPACITY: usize = 1000;

// --- CONFIGURATION ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDbConfig {
    pub data_root: PathBuf,
}

impl JsonDbConfig {
    pub fn new(data_root: PathBuf) -> Self {
        Self { data_root }
    }

    pub fn db_root(&self, db: &str) -> PathBuf {
        self.data_root.join(db)
    }

    pub fn db_collection_path(&self, db: &str, collection: &str) -> PathBuf {
        self.db_root(db).join("collections").join(collection)
    }

    pub fn wal_root(&self, db: &str) -> PathBuf {
        self.db_root(db).join("wal")
    }
}

/// Clé de stockage déterministe d'un document : hex(SHA-256(scope ‖ 0x00 ‖ id)).
///
/// Deux documents de même `(scope, id)` partagent toujours la même clé,
/// ce qui porte la contrainte d'unicité au niveau du système de fichiers.
pub fn document_key(scope: &str, id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update([0u8]);
    hasher.update(id.as_bytes());
    hex::encode(hasher.finalize())
}

// --- MOTEUR DE STOCKAGE ---

/// Poignée partagée sur le stockage : configuration, cache et verrous.
/// Le clonage est peu coûteux (état interne partagé).
#[derive(Debug, Clone)]
pub struct StorageEngine {
    pub config: JsonDbConfig,
    pub cache: cache::Cache<String, Value>,
    pub locks: LockManager,
}

impl StorageEngine {
    pub fn new(config: JsonDbConfig) -> Self {
        Self {
            config,
            cache: cache::Cache::new(CACHE_CAPACITY),
            locks: LockManager::new(),
        }
    }

    fn cache_key(db: &str, collection: &str, key: &str) -> String {
        format!("{}/{}/{}", db, collection, key)
    }

    /// Écrit un document (Disque puis Cache).
    /// L'appelant doit détenir le verrou d'écriture de la collection.
    pub async fn write_document(
        &self,
        db: &str,
        collection: &str,
        key: &str,
        doc: &Value,
    ) -> Result<()> {
        file_storage::write_document(&self.config, db, collection, key, doc).await?;
        self.cache
            .put(Self::cache_key(db, collection, key), doc.clone());
        Ok(())
    }

    /// Lit un document (Cache d'abord, sinon Disque).
    pub async fn read_document(
        &self,
        db: &str,
        collection: &str,
        key: &str,
    ) -> Result<Option<Value>> {
        let cache_key = Self::cache_key(db, collection, key);

        if let Some(doc) = self.cache.get(&cache_key) {
            return Ok(Some(doc));
        }

        let doc_opt = file_storage::read_document(&self.config, db, collection, key).await?;
        if let Some(doc) = &doc_opt {
            self.cache.put(cache_key, doc.clone());
        }
        Ok(doc_opt)
    }

    /// Supprime un document. Renvoie vrai s'il existait.
    pub async fn delete_document(&self, db: &str, collection: &str, key: &str) -> Result<bool> {
        let existed = file_storage::delete_document(&self.config, db, collection, key).await?;
        self.cache.remove(&Self::cache_key(db, collection, key));
        Ok(existed)
    }

    pub async fn list_keys(&self, db: &str, collection: &str) -> Result<Vec<String>> {
        file_storage::list_document_keys(&self.config, db, collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_document_key_is_scoped() {
        let a = document_key("sentinel-2", "S2A_1");
        assert_eq!(a, document_key("sentinel-2", "S2A_1"));
        assert_ne!(a, document_key("landsat", "S2A_1"));
        // Le séparateur évite les collisions par concaténation
        assert_ne!(document_key("ab", "c"), document_key("a", "bc"));
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_storage_engine_cache_hit() {
        let dir = tempdir().unwrap();
        let engine = StorageEngine::new(JsonDbConfig::new(dir.path().to_path_buf()));

        let doc = json!({"id": "a", "properties": {"gsd": 10}});
        engine.write_document("stac", "stac_item", "k1", &doc).await.unwrap();

        assert!(engine.cache.get(&"stac/stac_item/k1".to_string()).is_some());

        let read = engine
            .read_document("stac", "stac_item", "k1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read["properties"]["gsd"], 10);

        assert!(engine.delete_document("stac", "stac_item", "k1").await.unwrap());
        assert!(engine.cache.get(&"stac/stac_item/k1".to_string()).is_none());
        assert!(!engine.delete_document("stac", "stac_item", "k1").await.unwrap());
    }
}
