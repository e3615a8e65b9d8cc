// FICHIER : src-server/src/json_db/collections/manager.rs

use crate::json_db::storage::{file_storage, StorageEngine};
use crate::utils::{fs, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::debug;

use super::StoredDocument;

/// Lectures parallèles maximales lors d'un scan complet.
const SCAN_CONCURRENCY: usize = 16;

#[derive(Debug)]
pub struct CollectionsManager<'a> {
    pub storage: &'a StorageEngine,
    pub db: String,
}

impl<'a> CollectionsManager<'a> {
    pub fn new(storage: &'a StorageEngine, db: &str) -> Self {
        Self {
            storage,
            db: db.to_string(),
        }
    }

    /// Crée l'arborescence de la base puis vérifie qu'elle est utilisable.
    pub async fn init_db(&self) -> Result<()> {
        file_storage::create_db(&self.storage.config, &self.db).await?;
        file_storage::open_db(&self.storage.config, &self.db).await
    }

    // --- GESTION DES COLLECTIONS ---

    pub async fn create_collection(&self, name: &str) -> Result<()> {
        file_storage::create_collection(&self.storage.config, &self.db, name).await
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let root = self.storage.config.db_root(&self.db).join("collections");
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    pub async fn collection_exists(&self, name: &str) -> bool {
        fs::exists(&self.storage.config.db_collection_path(&self.db, name)).await
    }

    // --- MÉTHODES DE LECTURE ---

    /// Lecture d'un document sous verrou de lecture de la collection.
    pub async fn get_document(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let _guard = self.storage.locks.read(&self.db, collection).await;
        self.storage.read_document(&self.db, collection, key).await
    }

    /// Charge tous les documents d'une collection (instantané cohérent).
    pub async fn list_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let _guard = self.storage.locks.read(&self.db, collection).await;
        let keys = self.storage.list_keys(&self.db, collection).await?;
        debug!("🐢 Scan complet de '{}' ({} documents)", collection, keys.len());

        let documents: Vec<Option<StoredDocument>> = stream::iter(keys)
            .map(|key| async move {
                let doc = self.storage.read_document(&self.db, collection, &key).await?;
                Ok::<_, crate::utils::AppError>(doc.map(|document| StoredDocument { key, document }))
            })
            .buffered(SCAN_CONCURRENCY)
            .try_collect()
            .await?;

        Ok(documents.into_iter().flatten().collect())
    }

    pub async fn count(&self, collection: &str) -> Result<usize> {
        let _guard = self.storage.locks.read(&self.db, collection).await;
        Ok(self.storage.list_keys(&self.db, collection).await?.len())
    }
}
