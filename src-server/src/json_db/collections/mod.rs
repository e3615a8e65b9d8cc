//! Collections de stockage (un dossier par collection, un fichier par document)

use serde::{Deserialize, Serialize};

pub mod manager;

pub use manager::CollectionsManager;

/// Document tel qu'il est persisté, accompagné de sa clé de stockage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub key: String,
    pub document: serde_json::Value,
}
