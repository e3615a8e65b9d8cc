// FICHIER : src-server/src/utils/mod.rs

// =========================================================================
//  STAC SERVER UTILS - Foundation Layer
// =========================================================================

pub mod config;
pub mod env;
pub mod error;
pub mod fs;
pub mod json;
pub mod logger;

/// **Data Abstraction** : types JSON et dérivations serde des modèles.
pub mod data {
    pub use super::json::{json, Map, Value};
    pub use serde::{Deserialize, Serialize};
}

// --> Config & Erreurs
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use logger::init_logging;

// --> Async Runtime & Sync
pub use async_trait::async_trait;
pub use std::sync::Arc;
