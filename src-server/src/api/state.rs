// FICHIER : src-server/src/api/state.rs

use crate::stac::{BaseCoreClient, BaseTransactionsClient, CoreClient, Session, TransactionsClient};
use crate::utils::{AppConfig, Arc};

/// État partagé par les handlers : clients STAC et URL publique éventuelle.
#[derive(Clone)]
pub struct ApiState {
    pub core: Arc<dyn BaseCoreClient>,
    pub transactions: Arc<dyn BaseTransactionsClient>,
    pub base_url: Option<String>,
}

impl ApiState {
    pub fn new(session: Session, config: &AppConfig) -> Self {
        Self {
            core: Arc::new(CoreClient::new(session.clone(), config)),
            transactions: Arc::new(TransactionsClient::new(session)),
            base_url: config.base_url.clone(),
        }
    }
}
