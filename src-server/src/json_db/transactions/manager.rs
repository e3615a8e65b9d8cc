// FICHIER : src-server/src/json_db/transactions/manager.rs

use crate::json_db::indexes::{manager::validate_against, IndexManager};
use crate::json_db::storage::StorageEngine;
use crate::json_db::transactions::{
    wal, Operation, TransactionRecord, TransactionStatus, UndoImage,
};
use crate::utils::json;
use crate::utils::{AppError, Result};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, error, warn};
use uuid::Uuid;

pub struct TransactionManager<'a> {
    storage: &'a StorageEngine,
    db: String,
}

impl<'a> TransactionManager<'a> {
    pub fn new(storage: &'a StorageEngine, db: &str) -> Self {
        Self {
            storage,
            db: db.to_string(),
        }
    }

    /// Applique la liste d'opérations de façon atomique : tout ou rien.
    ///
    /// Protocole : verrous d'écriture (ordre trié) → résolution des
    /// `DeleteWhere` → contrôles et images d'annulation → WAL `pending` →
    /// application → marqueur `committed` → suppression du WAL. Un échec
    /// d'application restaure les images.
    ///
    /// Les `Require` sont vérifiés sous ces mêmes verrous : une écriture
    /// concurrente ne peut pas s'intercaler entre le contrôle et l'écriture.
    pub async fn execute(&self, operations: Vec<Operation>) -> Result<()> {
        if operations.is_empty() {
            return Ok(());
        }

        // 1. VERROUILLAGE
        let _guards = {
            let collections: BTreeSet<&str> =
                operations.iter().map(|op| op.collection()).collect();
            self.storage.locks.write_many(&self.db, collections).await
        };

        // 2. CONTRÔLES (sous verrou) + IMAGES D'ANNULATION
        let operations = self.resolve(operations).await?;
        if operations.is_empty() {
            return Ok(());
        }
        let undo = self.prepare(&operations).await?;

        let mut record = TransactionRecord {
            id: Uuid::new_v4().to_string(),
            status: TransactionStatus::Pending,
            operations,
            undo,
            started_at: Utc::now().timestamp_millis(),
        };

        // 3. EXÉCUTION ATOMIQUE
        wal::write_entry(&self.storage.config, &self.db, &record).await?;

        if let Err(e) = self.apply(&record.operations).await {
            warn!("↩️ Transaction {} annulée : {}", record.id, e);
            match self.restore(&record.undo).await {
                Ok(()) => wal::remove_entry(&self.storage.config, &self.db, &record.id).await?,
                Err(undo_err) => {
                    // L'entrée reste dans le WAL : `recover` retentera au démarrage
                    error!("❌ Annulation incomplète de {} : {}", record.id, undo_err);
                    record.status = TransactionStatus::Aborted;
                    if let Err(wal_err) =
                        wal::write_entry(&self.storage.config, &self.db, &record).await
                    {
                        error!("❌ WAL de {} non mis à jour : {}", record.id, wal_err);
                    }
                }
            }
            return Err(e);
        }

        record.status = TransactionStatus::Committed;
        wal::write_entry(&self.storage.config, &self.db, &record).await?;
        wal::remove_entry(&self.storage.config, &self.db, &record.id).await?;
        debug!(
            "✅ Transaction {} validée ({} opérations)",
            record.id,
            record.operations.len()
        );
        Ok(())
    }

    /// Remplace chaque `DeleteWhere` par les `Delete` des documents
    /// correspondants. L'appelant détient le verrou d'écriture.
    async fn resolve(&self, operations: Vec<Operation>) -> Result<Vec<Operation>> {
        let mut resolved = Vec::with_capacity(operations.len());
        for op in operations {
            let (collection, field, value) = match op {
                Operation::DeleteWhere {
                    collection,
                    field,
                    value,
                } => (collection, field, value),
                other => {
                    resolved.push(other);
                    continue;
                }
            };

            let mut matched = 0;
            for key in self.storage.list_keys(&self.db, &collection).await? {
                let Some(doc) = self.storage.read_document(&self.db, &collection, &key).await?
                else {
                    continue;
                };
                if json::get_path(&doc, &field) == Some(&value) {
                    matched += 1;
                    resolved.push(Operation::Delete {
                        collection: collection.clone(),
                        key,
                    });
                }
            }
            debug!(
                "🔎 {} document(s) de '{}' où {} = {}",
                matched, collection, field, value
            );
        }
        Ok(resolved)
    }

    async fn prepare(&self, operations: &[Operation]) -> Result<Vec<UndoImage>> {
        let indexes = IndexManager::new(self.storage, &self.db);
        let mut definitions = HashMap::new();
        // État courant vu par la transaction (disque + opérations précédentes)
        let mut overlay: HashMap<(&str, &str), bool> = HashMap::new();
        let mut undo = Vec::new();

        for op in operations {
            let Some(key) = op.key() else {
                return Err(AppError::System(anyhow::anyhow!(
                    "opération non résolue sur '{}'",
                    op.collection()
                )));
            };
            let slot = (op.collection(), key);

            if let Operation::Require { collection, key } = op {
                let exists = match overlay.get(&slot) {
                    Some(exists) => *exists,
                    None => self
                        .storage
                        .read_document(&self.db, collection, key)
                        .await?
                        .is_some(),
                };
                if !exists {
                    return Err(AppError::NotFound(format!(
                        "document '{}' absent de '{}'",
                        key, collection
                    )));
                }
                continue;
            }

            let exists = match overlay.get(&slot) {
                Some(exists) => *exists,
                None => {
                    let previous = self
                        .storage
                        .read_document(&self.db, op.collection(), key)
                        .await?;
                    let exists = previous.is_some();
                    undo.push(UndoImage {
                        collection: op.collection().to_string(),
                        key: key.to_string(),
                        previous,
                    });
                    exists
                }
            };

            match op {
                Operation::Insert { collection, key, .. } if exists => {
                    return Err(AppError::Conflict(format!(
                        "le document '{}' existe déjà dans '{}'",
                        key, collection
                    )));
                }
                Operation::Replace { collection, key, .. } if !exists => {
                    return Err(AppError::NotFound(format!(
                        "document '{}' absent de '{}'",
                        key, collection
                    )));
                }
                _ => {}
            }

            if let Some(document) = op.document() {
                if !definitions.contains_key(op.collection()) {
                    let defs = indexes.list_indexes(op.collection()).await?;
                    definitions.insert(op.collection(), defs);
                }
                if let Some(defs) = definitions.get(op.collection()) {
                    validate_against(defs, document)?;
                }
            }

            overlay.insert(slot, !matches!(op, Operation::Delete { .. }));
        }
        Ok(undo)
    }

    async fn apply(&self, operations: &[Operation]) -> Result<()> {
        for op in operations {
            match op {
                Operation::Insert {
                    collection,
                    key,
                    document,
                }
                | Operation::Replace {
                    collection,
                    key,
                    document,
                } => {
                    // Remplacement par renommage atomique : jamais de trou visible
                    self.storage
                        .write_document(&self.db, collection, key, document)
                        .await?
                }
                Operation::Delete { collection, key } => {
                    self.storage
                        .delete_document(&self.db, collection, key)
                        .await?;
                }
                Operation::Require { .. } | Operation::DeleteWhere { .. } => {}
            }
        }
        Ok(())
    }

    async fn restore(&self, undo: &[UndoImage]) -> Result<()> {
        for image in undo.iter().rev() {
            match &image.previous {
                Some(doc) => {
                    self.storage
                        .write_document(&self.db, &image.collection, &image.key, doc)
                        .await?
                }
                None => {
                    self.storage
                        .delete_document(&self.db, &image.collection, &image.key)
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Rejoue le WAL au démarrage : annule les transactions non validées,
    /// oublie celles qui l'étaient. Renvoie le nombre de transactions annulées.
    pub async fn recover(&self) -> Result<usize> {
        let pending = wal::list_pending(&self.storage.config, &self.db).await?;
        let mut rolled_back = 0;

        for record in pending {
            let collections: BTreeSet<&str> =
                record.undo.iter().map(|u| u.collection.as_str()).collect();
            let _guards = self
                .storage
                .locks
                .write_many(&self.db, collections.iter().copied())
                .await;

            if record.status != TransactionStatus::Committed {
                warn!(
                    "♻️ Récupération : annulation de la transaction {} ({:?})",
                    record.id, record.status
                );
                self.restore(&record.undo).await?;
                rolled_back += 1;
            }
            wal::remove_entry(&self.storage.config, &self.db, &record.id).await?;
        }
        Ok(rolled_back)
    }
}
