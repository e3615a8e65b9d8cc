// FICHIER : src-server/src/stac/client.rs

//! Contrats des clients STAC : la couche HTTP ne dépend que de ces traits.

use crate::stac::models::{
    Collection, Collections, Conformance, FeatureCollection, Item, LandingPage,
};
use crate::stac::search::SearchRequest;
use crate::utils::{async_trait, Result};

/// Forme du lien `next` d'une page de résultats.
#[derive(Debug, Clone, PartialEq)]
pub enum NextLinkStyle {
    /// Même URL, mêmes paramètres, `token` remplacé.
    Get { params: Vec<(String, String)> },
    /// Corps `{ token }` à fusionner dans la requête POST.
    Post,
}

/// Opérations de lecture (catalogue, collections, items, recherche).
#[async_trait]
pub trait BaseCoreClient: Send + Sync {
    async fn landing_page(&self, base_url: &str) -> Result<LandingPage>;

    fn conformance(&self) -> Conformance;

    async fn list_collections(&self, base_url: &str) -> Result<Collections>;

    async fn get_collection(&self, collection_id: &str, base_url: &str) -> Result<Collection>;

    async fn list_items(
        &self,
        collection_id: &str,
        limit: Option<i64>,
        token: Option<String>,
        base_url: &str,
    ) -> Result<FeatureCollection>;

    async fn get_item(&self, item_id: &str, collection_id: &str, base_url: &str) -> Result<Item>;

    async fn search(
        &self,
        request: SearchRequest,
        next_style: NextLinkStyle,
        base_url: &str,
    ) -> Result<FeatureCollection>;
}

/// Extension Transaction : création, mise à jour et suppression.
#[async_trait]
pub trait BaseTransactionsClient: Send + Sync {
    async fn create_item(&self, item: Item, base_url: &str) -> Result<Item>;

    async fn update_item(&self, item: Item, base_url: &str) -> Result<Item>;

    /// Idempotent : supprimer un item absent réussit.
    async fn delete_item(&self, item_id: &str, collection_id: &str) -> Result<()>;

    async fn create_collection(&self, collection: Collection, base_url: &str) -> Result<Collection>;

    async fn update_collection(&self, collection: Collection, base_url: &str) -> Result<Collection>;

    /// Supprime la collection et ses items. Idempotent.
    async fn delete_collection(&self, collection_id: &str) -> Result<()>;
}
