// FICHIER : src-server/src/json_db/transactions/wal.rs

use crate::json_db::storage::JsonDbConfig;
use crate::json_db::transactions::TransactionRecord;
use crate::utils::{fs, Result};
use std::path::PathBuf;

fn entry_path(config: &JsonDbConfig, db: &str, tx_id: &str) -> PathBuf {
    config.wal_root(db).join(format!("{}.json", tx_id))
}

/// Écrit une transaction dans le journal (Write Ahead Log), de façon atomique.
pub async fn write_entry(config: &JsonDbConfig, db: &str, record: &TransactionRecord) -> Result<()> {
    fs::write_json_atomic(&entry_path(config, db, &record.id), record).await
}

/// Supprime une entrée du WAL (Commit ou Rollback terminé).
pub async fn remove_entry(config: &JsonDbConfig, db: &str, tx_id: &str) -> Result<()> {
    fs::remove_file(&entry_path(config, db, tx_id)).await?;
    Ok(())
}

/// Transactions restées en attente (crash entre l'écriture du WAL et le commit).
pub async fn list_pending(config: &JsonDbConfig, db: &str) -> Result<Vec<TransactionRecord>> {
    let ids = fs::list_files_with_extension(&config.wal_root(db), "json").await?;
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        records.push(fs::read_json(&entry_path(config, db, &id)).await?);
    }
    Ok(records)
}

// ============================================================================
// TESTS UNITAIRES
// ============================================================================
