// FICHIER : src-server/src/stac/core.rs

use crate::json_db::collections::StoredDocument;
use crate::json_db::query::{Projection, QueryEngine, QueryResult};
use crate::stac::client::{BaseCoreClient, NextLinkStyle};
use crate::stac::links::{self, CollectionLinks, ItemLinks};
use crate::stac::models::{
    conformance_classes, Collection, Collections, Conformance, Context, FeatureCollection, Item,
    LandingPage, Link, STAC_VERSION,
};
use crate::stac::search::SearchRequest;
use crate::stac::translator::{self, TranslatedSearch};
use crate::stac::{collection_key, item_key, Session, COLLECTION_COLLECTION, ITEM_COLLECTION};
use crate::utils::config::CatalogConfig;
use crate::utils::json::{self, Map, Value};
use crate::utils::{async_trait, AppConfig, AppError, Result};
use tracing::{debug, instrument};

/// Client de lecture : toutes les opérations sont sans effet sur les données.
#[derive(Debug, Clone)]
pub struct CoreClient {
    session: Session,
    default_limit: usize,
    catalog: CatalogConfig,
}

impl CoreClient {
    pub fn new(session: Session, config: &AppConfig) -> Self {
        Self {
            session,
            default_limit: config.default_limit,
            catalog: config.catalog.clone(),
        }
    }

    async fn run_query(&self, operation: &str, translated: TranslatedSearch) -> Result<QueryResult> {
        let query = &translated.into_query(ITEM_COLLECTION);
        let session = &self.session;
        session
            .read(operation, || async move {
                let manager = session.collections();
                QueryEngine::new(&manager).execute_query(query.clone()).await
            })
            .await
            .map_err(|e| e.in_operation(operation, ITEM_COLLECTION))
    }

    async fn load_collection(&self, collection_id: &str) -> Result<Value> {
        let key = collection_key(collection_id);
        self.session
            .read("get_collection", || {
                let key = key.clone();
                async move {
                    self.session
                        .collections()
                        .get_document(COLLECTION_COLLECTION, &key)
                        .await
                }
            })
            .await
            .map_err(|e| e.in_operation("get_collection", format!("collection={}", collection_id)))?
            .ok_or_else(|| AppError::NotFound(format!("collection '{}'", collection_id)))
    }

    /// Page de résultats ; les liens stockés sont remplacés par des liens recalculés.
    fn feature_collection(
        &self,
        result: QueryResult,
        limit: usize,
        projection: Option<&Projection>,
        segments: &[&str],
        next_style: &NextLinkStyle,
        base_url: &str,
    ) -> Result<FeatureCollection> {
        let returned = result.documents.len() as u64;
        let features = result
            .documents
            .into_iter()
            .map(|doc| feature(doc, projection, base_url))
            .collect::<Result<Vec<_>>>()?;

        let mut page = FeatureCollection::new(features);
        page.links.push(Link::new("root", links::root_href(base_url)?).json());
        if let Some(cursor) = &result.next {
            let token = cursor.encode()?;
            page.links.push(match next_style {
                NextLinkStyle::Get { params } => {
                    links::next_get_link(base_url, segments, params, &token)?
                }
                NextLinkStyle::Post => links::next_post_link(base_url, segments, &token)?,
            });
        }
        page.context = Some(Context {
            returned,
            limit: limit as u64,
            matched: result.total_count,
        });
        page.number_matched = Some(result.total_count);
        page.number_returned = Some(returned);
        Ok(page)
    }
}

fn keeps_links(projection: Option<&Projection>) -> bool {
    match projection {
        None => true,
        Some(Projection::Include(fields)) => {
            fields.is_empty() || fields.iter().any(|f| f == "links")
        }
        Some(Projection::Exclude(fields)) => !fields.iter().any(|f| f == "links"),
    }
}

fn feature(
    doc: StoredDocument,
    projection: Option<&Projection>,
    base_url: &str,
) -> Result<Map<String, Value>> {
    let Value::Object(mut map) = doc.document else {
        return Err(AppError::from(format!(
            "document {} de '{}' n'est pas un objet",
            doc.key, ITEM_COLLECTION
        )));
    };
    if keeps_links(projection) {
        let id = map.get("id").and_then(Value::as_str).unwrap_or_default();
        let collection = map.get("collection").and_then(Value::as_str).unwrap_or_default();
        let links = ItemLinks::new(collection, id, base_url).create_links()?;
        map.insert("links".to_string(), json::to_value(links)?);
    }
    Ok(map)
}

fn collection_from(document: Value, base_url: &str) -> Result<Collection> {
    let mut collection: Collection = json::from_value(document)?;
    collection.links = CollectionLinks::new(&collection.id, base_url).create_links()?;
    Ok(collection)
}

#[async_trait]
impl BaseCoreClient for CoreClient {
    async fn landing_page(&self, base_url: &str) -> Result<LandingPage> {
        let root = links::root_href(base_url)?;
        Ok(LandingPage {
            r#type: "Catalog".to_string(),
            stac_version: STAC_VERSION.to_string(),
            id: self.catalog.id.clone(),
            title: self.catalog.title.clone(),
            description: self.catalog.description.clone(),
            conforms_to: conformance_classes(),
            links: vec![
                Link::new("self", root.clone()).json(),
                Link::new("root", root).json(),
                Link::new("data", links::href(base_url, &["collections"])?).json(),
                Link::new("conformance", links::href(base_url, &["conformance"])?).json(),
                Link::new("search", links::href(base_url, &["search"])?).geojson(),
            ],
        })
    }

    fn conformance(&self) -> Conformance {
        Conformance {
            conforms_to: conformance_classes(),
        }
    }

    #[instrument(skip(self))]
    async fn list_collections(&self, base_url: &str) -> Result<Collections> {
        let documents = self
            .session
            .read("list_collections", || async move {
                self.session.collections().list_all(COLLECTION_COLLECTION).await
            })
            .await
            .map_err(|e| e.in_operation("list_collections", COLLECTION_COLLECTION))?;

        let mut collections = documents
            .into_iter()
            .map(|doc| collection_from(doc.document, base_url))
            .collect::<Result<Vec<_>>>()?;
        collections.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Collections {
            collections,
            links: vec![
                Link::new("root", links::root_href(base_url)?).json(),
                Link::new("self", links::href(base_url, &["collections"])?).json(),
            ],
        })
    }

    #[instrument(skip(self))]
    async fn get_collection(&self, collection_id: &str, base_url: &str) -> Result<Collection> {
        let document = self.load_collection(collection_id).await?;
        collection_from(document, base_url)
    }

    #[instrument(skip(self))]
    async fn list_items(
        &self,
        collection_id: &str,
        limit: Option<i64>,
        token: Option<String>,
        base_url: &str,
    ) -> Result<FeatureCollection> {
        let request = SearchRequest {
            collections: Some(vec![collection_id.to_string()]),
            limit,
            token,
            ..Default::default()
        };
        let translated = translator::translate(&request, self.default_limit)?;
        self.load_collection(collection_id).await?;

        let limit = translated.limit;
        let result = self.run_query("list_items", translated).await?;
        debug!("📄 {} items rendus pour '{}'", result.documents.len(), collection_id);

        let next_style = NextLinkStyle::Get {
            params: vec![("limit".to_string(), limit.to_string())],
        };
        self.feature_collection(
            result,
            limit,
            None,
            &["collections", collection_id, "items"],
            &next_style,
            base_url,
        )
    }

    #[instrument(skip(self))]
    async fn get_item(&self, item_id: &str, collection_id: &str, base_url: &str) -> Result<Item> {
        let key = item_key(collection_id, item_id);
        let document = self
            .session
            .read("get_item", || {
                let key = key.clone();
                async move {
                    self.session
                        .collections()
                        .get_document(ITEM_COLLECTION, &key)
                        .await
                }
            })
            .await
            .map_err(|e| {
                e.in_operation(
                    "get_item",
                    format!("item={} collection={}", item_id, collection_id),
                )
            })?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "item '{}' de la collection '{}'",
                    item_id, collection_id
                ))
            })?;

        let mut item: Item = json::from_value(document)?;
        item.links = ItemLinks::new(collection_id, item_id, base_url).create_links()?;
        Ok(item)
    }

    #[instrument(skip(self, request, next_style))]
    async fn search(
        &self,
        request: SearchRequest,
        next_style: NextLinkStyle,
        base_url: &str,
    ) -> Result<FeatureCollection> {
        // Erreurs de traduction levées avant toute I/O
        let translated = translator::translate(&request, self.default_limit)?;
        let limit = translated.limit;
        let projection = translated.projection.clone();

        let result = self.run_query("search", translated).await?;
        self.feature_collection(
            result,
            limit,
            projection.as_ref(),
            &["search"],
            &next_style,
            base_url,
        )
    }
}
