// FICHIER : src-server/src/stac/mod.rs

// =========================================================================
//  STAC : modèles, traduction des recherches, clients de lecture/écriture
// =========================================================================

pub mod client;
pub mod core;
pub mod links;
pub mod models;
pub mod search;
pub mod session;
pub mod transactions;
pub mod translator;

pub use client::{BaseCoreClient, BaseTransactionsClient};
pub use self::core::CoreClient;
pub use session::Session;
pub use transactions::TransactionsClient;

use crate::json_db::storage::document_key;

/// Collection de stockage des items.
pub const ITEM_COLLECTION: &str = "stac_item";
/// Collection de stockage des collections STAC.
pub const COLLECTION_COLLECTION: &str = "stac_collection";

const COLLECTION_SCOPE: &str = "collection";

/// Clé de stockage d'une collection STAC (unicité de `id`).
pub fn collection_key(collection_id: &str) -> String {
    document_key(COLLECTION_SCOPE, collection_id)
}

/// Clé de stockage d'un item (unicité de `(id, collection)`).
pub fn item_key(collection_id: &str, item_id: &str) -> String {
    document_key(collection_id, item_id)
}
