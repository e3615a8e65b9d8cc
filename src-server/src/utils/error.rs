use serde::Serialize;
use std::io;

// --- RE-EXPORTS ANYHOW ---
pub use anyhow::{anyhow, Context};
pub use anyhow::Result as AnyResult;

// --- GESTION D'ERREUR STRICTE ---

/// Type de résultat standard du serveur STAC.
pub type Result<T> = std::result::Result<T, AppError>;

/// Enumération centrale des erreurs.
///
/// Chaque chemin d'échec produit une variante typée et inspectable :
/// la couche HTTP s'appuie sur la variante pour choisir le code de statut.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Erreur de configuration : {0}")]
    Config(String),

    #[error("Erreur d'entrée/sortie : {0}")]
    Io(#[from] io::Error),

    /// Filtre mal formé, opérateur inconnu, limite non positive, géométrie invalide...
    #[error("Requête invalide : {0}")]
    Validation(String),

    #[error("Introuvable : {0}")]
    NotFound(String),

    #[error("Conflit : {0}")]
    Conflict(String),

    /// Stockage injoignable (fatal au démarrage, 503 en cours de requête).
    #[error("Stockage indisponible : {0}")]
    StorageUnavailable(String),

    #[error("Délai dépassé pour '{operation}' ({millis} ms)")]
    StorageTimeout { operation: String, millis: u64 },

    /// Échec du stockage, enrichi de l'opération et de l'identifiant concerné.
    #[error("Erreur de stockage pendant '{operation}' ({context}) : {source}")]
    Storage {
        operation: String,
        context: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Erreur de sérialisation : {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Erreur Système : {0}")]
    System(#[from] anyhow::Error),
}

impl AppError {
    /// Attache le nom de l'opération et son contexte (id de collection/item).
    /// Les erreurs métier (validation, conflit, introuvable, délai) restent telles quelles.
    pub fn in_operation(self, operation: &str, context: impl Into<String>) -> Self {
        match self {
            AppError::Io(_) | AppError::Serialization(_) | AppError::System(_) => {
                AppError::Storage {
                    operation: operation.to_string(),
                    context: context.into(),
                    source: Box::new(self),
                }
            }
            other => other,
        }
    }

    /// Vrai si l'appelant peut retenter la requête telle quelle.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::StorageUnavailable(_) | AppError::StorageTimeout { .. } => true,
            AppError::Storage { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Variante « racine » (en traversant les enveloppes `Storage`).
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Storage { source, .. } => source.root(),
            other => other,
        }
    }
}

// Les erreurs remontent en JSON vers les clients HTTP et dans les logs structurés.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::System(anyhow::anyhow!(s))
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::System(anyhow::anyhow!(s.to_string()))
    }
}
