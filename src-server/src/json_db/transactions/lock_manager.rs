// FICHIER : src-server/src/json_db/transactions/lock_manager.rs

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Gestionnaire de verrous (granularité : Collection), partagé par tout le processus.
///
/// Les lectures de documents prennent le verrou en lecture, les transactions
/// le prennent en écriture : un lecteur voit l'état avant ou après une
/// transaction, jamais un état intermédiaire.
#[derive(Debug, Default, Clone)]
pub struct LockManager {
    // Clé = "db/collection"
    locks: Arc<Mutex<HashMap<String, Arc<RwLock<()>>>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, db: &str, collection: &str) -> Arc<RwLock<()>> {
        let key = format!("{}/{}", db, collection);
        let mut map = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(key)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    pub async fn read(&self, db: &str, collection: &str) -> OwnedRwLockReadGuard<()> {
        self.lock_for(db, collection).read_owned().await
    }

    /// Verrous d'écriture sur plusieurs collections, acquis dans l'ordre trié
    /// (ordre global identique pour tous les appelants : pas d'interblocage).
    pub async fn write_many<'c, I>(&self, db: &str, collections: I) -> Vec<OwnedRwLockWriteGuard<()>>
    where
        I: IntoIterator<Item = &'c str>,
    {
        let sorted: BTreeSet<&str> = collections.into_iter().collect();
        let mut guards = Vec::with_capacity(sorted.len());
        for collection in sorted {
            guards.push(self.lock_for(db, collection).write_owned().await);
        }
        guards
    }
}
