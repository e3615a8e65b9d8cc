// FICHIER : src-server/src/stac/session.rs

//! Poignée de stockage unique du processus.
//!
//! Ouverte une fois au démarrage (`connect`), partagée par tous les clients,
//! fermée explicitement à l'arrêt (`close`) après drainage des opérations en vol.

use crate::json_db::collections::CollectionsManager;
use crate::json_db::indexes::{IndexDefinition, IndexKind, IndexManager};
use crate::json_db::storage::{JsonDbConfig, StorageEngine};
use crate::json_db::transactions::TransactionManager;
use crate::stac::{COLLECTION_COLLECTION, ITEM_COLLECTION};
use crate::utils::config::StorageConfig;
use crate::utils::{AppError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};
use tracing::{info, warn};

/// Index exigés sur `stac_item` (création idempotente au démarrage).
pub fn required_item_indexes() -> Vec<IndexDefinition> {
    vec![
        IndexDefinition::geo("bbox").then("properties.datetime", IndexKind::Ascending),
        IndexDefinition::geo("geometry"),
        IndexDefinition::geo("bbox"),
        IndexDefinition::ascending("properties.datetime"),
        IndexDefinition::ascending("properties.created"),
        IndexDefinition::ascending("properties.updated"),
    ]
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: StorageEngine,
    db: String,
    timeout: Duration,
    /// Chaque opération détient une lecture ; `close` prend l'écriture pour drainer.
    gate: Arc<RwLock<()>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("db", &self.inner.db)
            .field("timeout", &self.inner.timeout)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn unavailable(e: AppError) -> AppError {
    match e {
        AppError::StorageUnavailable(_) => e,
        other => AppError::StorageUnavailable(other.to_string()),
    }
}

impl Session {
    /// Ouvre le stockage : arborescence, reprise du WAL, index requis.
    /// Tout échec (ou dépassement du délai) est un `StorageUnavailable`.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let storage = StorageEngine::new(JsonDbConfig::new(config.data_root.clone()));
        let timeout = config.request_timeout();

        let opening = Self::open(&storage, &config.db_name);
        match tokio::time::timeout(timeout, opening).await {
            Ok(res) => res.map_err(unavailable)?,
            Err(_) => {
                return Err(AppError::StorageUnavailable(format!(
                    "ouverture de {:?} au-delà de {} ms",
                    config.data_root,
                    timeout.as_millis()
                )))
            }
        }

        info!(
            "💾 Stockage ouvert : {:?} (base '{}')",
            config.data_root, config.db_name
        );
        Ok(Self {
            inner: Arc::new(SessionInner {
                storage,
                db: config.db_name.clone(),
                timeout,
                gate: Arc::new(RwLock::new(())),
                closed: AtomicBool::new(false),
            }),
        })
    }

    async fn open(storage: &StorageEngine, db: &str) -> Result<()> {
        let manager = CollectionsManager::new(storage, db);
        manager.init_db().await?;
        for collection in [ITEM_COLLECTION, COLLECTION_COLLECTION] {
            manager.create_collection(collection).await?;
        }

        let rolled_back = TransactionManager::new(storage, db).recover().await?;
        if rolled_back > 0 {
            warn!("♻️ {} transaction(s) interrompue(s) annulée(s)", rolled_back);
        }

        let indexes = IndexManager::new(storage, db);
        for definition in required_item_indexes() {
            indexes.ensure_index(ITEM_COLLECTION, definition).await?;
        }
        Ok(())
    }

    pub fn storage(&self) -> &StorageEngine {
        &self.inner.storage
    }

    pub fn db(&self) -> &str {
        &self.inner.db
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn collections(&self) -> CollectionsManager<'_> {
        CollectionsManager::new(&self.inner.storage, &self.inner.db)
    }

    pub fn transactions(&self) -> TransactionManager<'_> {
        TransactionManager::new(&self.inner.storage, &self.inner.db)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn closed_error() -> AppError {
        AppError::StorageUnavailable("session de stockage fermée".to_string())
    }

    async fn enter(&self) -> Result<OwnedRwLockReadGuard<()>> {
        if self.is_closed() {
            return Err(Self::closed_error());
        }
        let permit = self.inner.gate.clone().read_owned().await;
        // `close` a pu passer pendant l'attente
        if self.is_closed() {
            return Err(Self::closed_error());
        }
        Ok(permit)
    }

    fn timeout_error(&self, operation: &str) -> AppError {
        AppError::StorageTimeout {
            operation: operation.to_string(),
            millis: self.inner.timeout.as_millis() as u64,
        }
    }

    /// Lecture sous délai ; un dépassement est retenté une fois.
    pub async fn read<T, F, Fut>(&self, operation: &str, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _permit = self.enter().await?;
        for attempt in 1..=2 {
            match tokio::time::timeout(self.inner.timeout, f()).await {
                Ok(res) => return res,
                Err(_) => warn!("⏱️ '{}' : délai dépassé (tentative {})", operation, attempt),
            }
        }
        Err(self.timeout_error(operation))
    }

    /// Écriture sous délai, jamais retentée.
    ///
    /// L'opération tourne dans sa propre tâche : l'abandon de la requête
    /// appelante ne l'interrompt pas en pleine transaction.
    pub async fn write<T, F, Fut>(&self, operation: &str, f: F) -> Result<T>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.enter().await?;
        let task = f(self.clone());
        let handle = tokio::spawn(async move {
            let _permit = permit;
            task.await
        });

        match tokio::time::timeout(self.inner.timeout, handle).await {
            Ok(Ok(res)) => res,
            Ok(Err(join_err)) => Err(AppError::System(anyhow::anyhow!(
                "tâche d'écriture '{}' interrompue : {}",
                operation,
                join_err
            ))),
            Err(_) => {
                warn!("⏱️ '{}' : délai dépassé (écriture non retentée)", operation);
                Err(self.timeout_error(operation))
            }
        }
    }

    /// Refuse les nouvelles opérations puis attend la fin de celles en cours.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _drained = self.inner.gate.write().await;
        let stats = self.inner.storage.cache.stats();
        info!(
            "🔒 Session fermée (cache : {} succès, {} échecs, {} documents)",
            stats.hits, stats.misses, stats.len
        );
    }
}
