// FICHIER : src-server/src/utils/config.rs

use crate::utils::env;
use crate::utils::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Constantes Système (Single Source of Truth)
pub const DEFAULT_DB_NAME: &str = "stac";
pub const DEFAULT_DATA_DIR: &str = "stac_data";
pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;

/// Configuration du processus, lue une fois au démarrage puis passée explicitement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub app_host: String,
    pub app_port: u16,

    pub storage: StorageConfig,

    /// URL publique forcée ; sinon déduite de chaque requête (Host).
    pub base_url: Option<String>,
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub data_root: PathBuf,
    pub db_name: String,
    pub request_timeout_ms: u64,
}

/// Métadonnées de la page d'accueil (Catalog racine).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    pub id: String,
    pub title: String,
    pub description: String,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            id: "stac-server".to_string(),
            title: "STAC API".to_string(),
            description: "Catalogue STAC servi depuis une base documentaire JSON".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            db_name: DEFAULT_DB_NAME.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AppConfig {
    /// Construit la configuration depuis l'environnement du processus.
    pub fn from_env() -> Result<Self> {
        let data_root = match env::get_optional("STAC_DATA_ROOT") {
            Some(p) => PathBuf::from(p),
            None => dirs::home_dir()
                .ok_or_else(|| {
                    AppError::Config(
                        "STAC_DATA_ROOT absent et répertoire personnel introuvable".to_string(),
                    )
                })?
                .join(DEFAULT_DATA_DIR),
        };

        let request_timeout_ms =
            env::get_parsed_or("STAC_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        if request_timeout_ms == 0 {
            return Err(AppError::Config(
                "STAC_REQUEST_TIMEOUT_MS doit être strictement positif".to_string(),
            ));
        }

        let default_limit = env::get_parsed_or("STAC_DEFAULT_LIMIT", DEFAULT_LIMIT)?;
        if default_limit == 0 {
            return Err(AppError::Config(
                "STAC_DEFAULT_LIMIT doit être strictement positif".to_string(),
            ));
        }

        let defaults = CatalogConfig::default();
        let config = AppConfig {
            app_host: env::get_or("APP_HOST", "0.0.0.0"),
            app_port: env::get_parsed_or("APP_PORT", 8080u16)?,
            storage: StorageConfig {
                data_root,
                db_name: env::get_or("STAC_DB_NAME", DEFAULT_DB_NAME),
                request_timeout_ms,
            },
            base_url: env::get_optional("STAC_BASE_URL").map(normalize_base_url),
            log_dir: env::get_optional("STAC_LOG_DIR").map(PathBuf::from),
            default_limit,
            catalog: CatalogConfig {
                id: env::get_or("STAC_CATALOG_ID", &defaults.id),
                title: env::get_or("STAC_CATALOG_TITLE", &defaults.title),
                description: env::get_or("STAC_CATALOG_DESCRIPTION", &defaults.description),
            },
        };

        Ok(config)
    }

    /// Configuration minimale pointant sur un répertoire donné (tests, outils).
    pub fn for_data_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            app_host: "127.0.0.1".to_string(),
            app_port: 8080,
            storage: StorageConfig::new(data_root),
            base_url: None,
            log_dir: None,
            default_limit: DEFAULT_LIMIT,
            catalog: CatalogConfig::default(),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }
}

/// Les liens sont construits par `Url::join` : la base doit finir par '/'.
pub fn normalize_base_url(raw: impl Into<String>) -> String {
    let mut url = raw.into();
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

// --- TESTS UNITAIRES ---
