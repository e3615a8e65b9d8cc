// FICHIER : src-server/src/json_db/indexes/manager.rs

use crate::json_db::query::spatial;
use crate::json_db::storage::StorageEngine;
use crate::utils::{fs, json, AppError, Result};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use super::IndexDefinition;

const INDEXES_FILE: &str = "_indexes.json";

pub struct IndexManager<'a> {
    storage: &'a StorageEngine,
    db: String,
}

impl<'a> IndexManager<'a> {
    pub fn new(storage: &'a StorageEngine, db: &str) -> Self {
        Self {
            storage,
            db: db.to_string(),
        }
    }

    fn definitions_path(&self, collection: &str) -> PathBuf {
        self.storage
            .config
            .db_collection_path(&self.db, collection)
            .join(INDEXES_FILE)
    }

    pub async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexDefinition>> {
        Ok(fs::read_json_optional(&self.definitions_path(collection))
            .await?
            .unwrap_or_default())
    }

    /// Enregistre l'index s'il n'existe pas déjà (même liste de clés).
    /// Renvoie vrai si l'index vient d'être créé.
    pub async fn ensure_index(&self, collection: &str, definition: IndexDefinition) -> Result<bool> {
        let _guards = self.storage.locks.write_many(&self.db, [collection]).await;

        let mut definitions = self.list_indexes(collection).await?;
        if definitions.iter().any(|d| d.keys == definition.keys) {
            return Ok(false);
        }

        info!("🗂️ Création de l'index '{}' sur '{}'", definition.name, collection);
        definitions.push(definition);
        fs::write_json_atomic(&self.definitions_path(collection), &definitions).await?;
        Ok(true)
    }

    /// Refuse un document dont un champ indexé 2dsphere n'est pas une géométrie exploitable.
    pub async fn validate_document(&self, collection: &str, document: &Value) -> Result<()> {
        let definitions = self.list_indexes(collection).await?;
        validate_against(&definitions, document)
    }
}

pub fn validate_against(definitions: &[IndexDefinition], document: &Value) -> Result<()> {
    for field in definitions.iter().flat_map(|d| d.geo_fields()) {
        match json::get_path(document, field) {
            None | Some(Value::Null) => continue,
            Some(value) => {
                spatial::parse_geo_value(value).map_err(|e| {
                    AppError::Validation(format!(
                        "le champ indexé '{}' n'est pas une géométrie valide ({})",
                        field, e
                    ))
                })?;
            }
        }
    }
    Ok(())
}
