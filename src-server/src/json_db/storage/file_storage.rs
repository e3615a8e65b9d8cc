// FICHIER : src-server/src/json_db/storage/file_storage.rs

use crate::json_db::storage::JsonDbConfig;
use crate::utils::{fs, AppError, Result};
use serde_json::Value;

/// Fichier témoin utilisé pour vérifier que la racine est inscriptible.
const PROBE_FILE: &str = "_probe.json";

/// Vérifie que la base existe et reste inscriptible.
pub async fn open_db(config: &JsonDbConfig, db: &str) -> Result<()> {
    let db_path = config.db_root(db);
    if !fs::exists(&db_path).await {
        return Err(AppError::StorageUnavailable(format!(
            "Base inexistante : {:?}",
            db_path
        )));
    }

    let probe = db_path.join(PROBE_FILE);
    fs::write_atomic(&probe, b"{}")
        .await
        .map_err(|e| AppError::StorageUnavailable(format!("{:?} non inscriptible : {}", db_path, e)))?;
    fs::remove_file(&probe).await?;
    Ok(())
}

/// Crée l'arborescence physique de la base (idempotent).
pub async fn create_db(config: &JsonDbConfig, db: &str) -> Result<()> {
    let db_root = config.db_root(db);
    fs::ensure_dir(&db_root.join("collections"))
        .await
        .map_err(|e| AppError::StorageUnavailable(format!("{:?} : {}", db_root, e)))?;
    fs::ensure_dir(&config.wal_root(db))
        .await
        .map_err(|e| AppError::StorageUnavailable(format!("{:?} : {}", db_root, e)))?;
    Ok(())
}

pub async fn create_collection(config: &JsonDbConfig, db: &str, collection: &str) -> Result<()> {
    fs::ensure_dir(&config.db_collection_path(db, collection)).await
}

pub async fn write_document(
    config: &JsonDbConfig,
    db: &str,
    collection: &str,
    key: &str,
    doc: &Value,
) -> Result<()> {
    let file_path = config
        .db_collection_path(db, collection)
        .join(format!("{}.json", key));
    fs::write_json_atomic(&file_path, doc).await
}

pub async fn read_document(
    config: &JsonDbConfig,
    db: &str,
    collection: &str,
    key: &str,
) -> Result<Option<Value>> {
    let file_path = config
        .db_collection_path(db, collection)
        .join(format!("{}.json", key));
    fs::read_json_optional(&file_path).await
}

pub async fn delete_document(
    config: &JsonDbConfig,
    db: &str,
    collection: &str,
    key: &str,
) -> Result<bool> {
    let file_path = config
        .db_collection_path(db, collection)
        .join(format!("{}.json", key));
    fs::remove_file(&file_path).await
}

/// Clés des documents d'une collection, triées. Les fichiers `_*.json` sont des métadonnées.
pub async fn list_document_keys(
    config: &JsonDbConfig,
    db: &str,
    collection: &str,
) -> Result<Vec<String>> {
    let names =
        fs::list_files_with_extension(&config.db_collection_path(db, collection), "json").await?;
    Ok(names.into_iter().filter(|n| !n.starts_with('_')).collect())
}
