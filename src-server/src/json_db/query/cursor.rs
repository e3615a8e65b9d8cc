// FICHIER : src-server/src/json_db/query/cursor.rs

use crate::utils::{AppError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Position de reprise (keyset) : valeurs de tri et clé du dernier document rendu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub key: String,
    #[serde(default)]
    pub sort_values: Vec<Value>,
}

impl Cursor {
    /// Jeton opaque : base64 URL-safe (sans padding) du JSON du curseur.
    pub fn encode(&self) -> Result<String> {
        Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?))
    }

    pub fn decode(token: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| AppError::Validation(format!("jeton de pagination illisible : '{}'", token)))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AppError::Validation(format!("jeton de pagination invalide : '{}'", token)))
    }
}
