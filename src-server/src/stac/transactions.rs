// FICHIER : src-server/src/stac/transactions.rs

use crate::json_db::query::spatial;
use crate::json_db::transactions::Operation;
use crate::stac::client::BaseTransactionsClient;
use crate::stac::links::{CollectionLinks, ItemLinks};
use crate::stac::models::{Collection, Item};
use crate::stac::{collection_key, item_key, Session, COLLECTION_COLLECTION, ITEM_COLLECTION};
use crate::utils::json::{self, Value};
use crate::utils::{async_trait, AppError, Result};
use chrono::{SecondsFormat, Utc};
use tracing::{info, instrument};

/// Horodatage RFC 3339 en UTC, à la milliseconde (`2024-05-01T12:00:00.000Z`).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Client d'écriture (extension Transaction).
///
/// Chaque mutation est une transaction unique du magasin : une mise à jour
/// remplace le document en une fois, sans fenêtre où il serait absent.
#[derive(Debug, Clone)]
pub struct TransactionsClient {
    session: Session,
}

fn require_id(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} manquant", kind)));
    }
    Ok(())
}

/// Emprise calculée depuis la géométrie quand le client n'en fournit pas.
fn ensure_bbox(item: &mut Item) -> Result<()> {
    if item.bbox.is_some() {
        return Ok(());
    }
    if let Some(geometry) = item.geometry.as_ref().filter(|g| !g.is_null()) {
        item.bbox = spatial::bounding_box(geometry)?;
    }
    Ok(())
}

impl TransactionsClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    async fn load(&self, operation: &str, collection: &str, key: String) -> Result<Option<Value>> {
        let session = &self.session;
        let key = &key;
        session
            .read(operation, || async move {
                session.collections().get_document(collection, key).await
            })
            .await
    }

    async fn commit(&self, operation: &str, operations: Vec<Operation>) -> Result<()> {
        self.session
            .write(operation, move |session| async move {
                session.transactions().execute(operations).await
            })
            .await
    }
}

#[async_trait]
impl BaseTransactionsClient for TransactionsClient {
    #[instrument(skip(self, item), fields(item_id = %item.id, collection = %item.collection))]
    async fn create_item(&self, mut item: Item, base_url: &str) -> Result<Item> {
        require_id("id de l'item", &item.id)?;
        require_id("collection de l'item", &item.collection)?;
        ensure_bbox(&mut item)?;
        item.links = ItemLinks::new(&item.collection, &item.id, base_url).create_links()?;
        if !item.properties.contains_key("created") {
            item.properties
                .insert("created".to_string(), Value::String(now_rfc3339()));
        }

        let context = format!("item={} collection={}", item.id, item.collection);
        // Le parent est vérifié sous le même verrou que l'insertion
        let operations = vec![
            Operation::Require {
                collection: COLLECTION_COLLECTION.to_string(),
                key: collection_key(&item.collection),
            },
            Operation::Insert {
                collection: ITEM_COLLECTION.to_string(),
                key: item_key(&item.collection, &item.id),
                document: json::to_value(&item)?,
            },
        ];
        self.commit("create_item", operations)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::NotFound(format!("collection '{}'", item.collection))
                }
                AppError::Conflict(_) => AppError::Conflict(format!(
                    "l'item '{}' existe déjà dans la collection '{}'",
                    item.id, item.collection
                )),
                other => other.in_operation("create_item", context),
            })?;

        info!("🆕 Item '{}' créé dans '{}'", item.id, item.collection);
        Ok(item)
    }

    #[instrument(skip(self, item), fields(item_id = %item.id, collection = %item.collection))]
    async fn update_item(&self, mut item: Item, base_url: &str) -> Result<Item> {
        require_id("id de l'item", &item.id)?;
        require_id("collection de l'item", &item.collection)?;
        ensure_bbox(&mut item)?;
        item.links = ItemLinks::new(&item.collection, &item.id, base_url).create_links()?;

        let context = format!("item={} collection={}", item.id, item.collection);
        let key = item_key(&item.collection, &item.id);
        let stored = self
            .load("update_item", ITEM_COLLECTION, key.clone())
            .await
            .map_err(|e| e.in_operation("update_item", context.clone()))?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "item '{}' de la collection '{}'",
                    item.id, item.collection
                ))
            })?;

        // `created` ne change jamais une fois posé
        if let Some(created) = json::get_path(&stored, "properties.created") {
            item.properties
                .insert("created".to_string(), created.clone());
        }
        item.properties
            .insert("updated".to_string(), Value::String(now_rfc3339()));

        let operation = Operation::Replace {
            collection: ITEM_COLLECTION.to_string(),
            key,
            document: json::to_value(&item)?,
        };
        self.commit("update_item", vec![operation])
            .await
            .map_err(|e| e.in_operation("update_item", context))?;

        info!("✏️ Item '{}' mis à jour dans '{}'", item.id, item.collection);
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn delete_item(&self, item_id: &str, collection_id: &str) -> Result<()> {
        let operation = Operation::Delete {
            collection: ITEM_COLLECTION.to_string(),
            key: item_key(collection_id, item_id),
        };
        self.commit("delete_item", vec![operation]).await.map_err(|e| {
            e.in_operation(
                "delete_item",
                format!("item={} collection={}", item_id, collection_id),
            )
        })
    }

    #[instrument(skip(self, collection), fields(collection = %collection.id))]
    async fn create_collection(
        &self,
        mut collection: Collection,
        base_url: &str,
    ) -> Result<Collection> {
        require_id("id de la collection", &collection.id)?;
        collection.links = CollectionLinks::new(&collection.id, base_url).create_links()?;

        // L'insertion échoue sous verrou si l'id existe déjà
        let operation = Operation::Insert {
            collection: COLLECTION_COLLECTION.to_string(),
            key: collection_key(&collection.id),
            document: json::to_value(&collection)?,
        };
        self.commit("create_collection", vec![operation])
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("la collection '{}' existe déjà", collection.id))
                }
                other => other.in_operation("create_collection", format!("collection={}", collection.id)),
            })?;

        info!("🆕 Collection '{}' créée", collection.id);
        Ok(collection)
    }

    #[instrument(skip(self, collection), fields(collection = %collection.id))]
    async fn update_collection(
        &self,
        mut collection: Collection,
        base_url: &str,
    ) -> Result<Collection> {
        require_id("id de la collection", &collection.id)?;
        collection.links = CollectionLinks::new(&collection.id, base_url).create_links()?;

        let context = format!("collection={}", collection.id);
        let key = collection_key(&collection.id);
        let stored = self
            .load("update_collection", COLLECTION_COLLECTION, key.clone())
            .await
            .map_err(|e| e.in_operation("update_collection", context.clone()))?
            .ok_or_else(|| AppError::NotFound(format!("collection '{}'", collection.id)))?;

        if let Some(created) = stored.get("created") {
            collection
                .additional_fields
                .insert("created".to_string(), created.clone());
        }

        let operation = Operation::Replace {
            collection: COLLECTION_COLLECTION.to_string(),
            key,
            document: json::to_value(&collection)?,
        };
        self.commit("update_collection", vec![operation])
            .await
            .map_err(|e| e.in_operation("update_collection", context))?;

        info!("✏️ Collection '{}' mise à jour", collection.id);
        Ok(collection)
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, collection_id: &str) -> Result<()> {
        let context = format!("collection={}", collection_id);
        // Items et collection disparaissent ensemble ; les items sont
        // recherchés sous le verrou d'écriture
        let operations = vec![
            Operation::DeleteWhere {
                collection: ITEM_COLLECTION.to_string(),
                field: "collection".to_string(),
                value: Value::String(collection_id.to_string()),
            },
            Operation::Delete {
                collection: COLLECTION_COLLECTION.to_string(),
                key: collection_key(collection_id),
            },
        ];

        self.commit("delete_collection", operations)
            .await
            .map_err(|e| e.in_operation("delete_collection", context))?;

        info!("🗑️ Collection '{}' supprimée", collection_id);
        Ok(())
    }
}
