//! Transactions atomiques multi-documents

pub mod lock_manager;
pub mod manager;
pub mod wal;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use manager::TransactionManager;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Échoue (Conflit) si la clé existe déjà.
    Insert {
        collection: String,
        key: String,
        document: Value,
    },
    /// Échoue (Introuvable) si la clé n'existe pas.
    Replace {
        collection: String,
        key: String,
        document: Value,
    },
    /// Sans effet si la clé n'existe pas.
    Delete { collection: String, key: String },
    /// N'écrit rien ; échoue (Introuvable) si la clé n'existe pas au moment
    /// de la transaction.
    Require { collection: String, key: String },
    /// Supprime les documents dont `field` vaut `value`.
    /// Résolue en `Delete` sous verrou, avant les contrôles.
    DeleteWhere {
        collection: String,
        field: String,
        value: Value,
    },
}

impl Operation {
    pub fn collection(&self) -> &str {
        match self {
            Operation::Insert { collection, .. }
            | Operation::Replace { collection, .. }
            | Operation::Delete { collection, .. }
            | Operation::Require { collection, .. }
            | Operation::DeleteWhere { collection, .. } => collection,
        }
    }

    /// Clé visée ; `None` pour une suppression par critère.
    pub fn key(&self) -> Option<&str> {
        match self {
            Operation::Insert { key, .. }
            | Operation::Replace { key, .. }
            | Operation::Delete { key, .. }
            | Operation::Require { key, .. } => Some(key),
            Operation::DeleteWhere { .. } => None,
        }
    }

    pub fn document(&self) -> Option<&Value> {
        match self {
            Operation::Insert { document, .. } | Operation::Replace { document, .. } => {
                Some(document)
            }
            _ => None,
        }
    }
}

/// État d'un document avant la transaction (`None` : absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoImage {
    pub collection: String,
    pub key: String,
    pub previous: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Committed,
    Aborted,
}

/// Enregistrement persistant d'une transaction dans le WAL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub status: TransactionStatus,
    pub operations: Vec<Operation>,
    pub undo: Vec<UndoImage>,
    pub started_at: i64,
}
