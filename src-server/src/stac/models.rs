// FICHIER : src-server/src/stac/models.rs

//! Objets STAC échangés avec les clients HTTP et stockés en base.

use crate::utils::data::{Deserialize, Map, Serialize, Value};

pub const STAC_VERSION: &str = "1.0.0";

fn default_stac_version() -> String {
    STAC_VERSION.to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn collection_type() -> String {
    "Collection".to_string()
}

// --- LIENS ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Méthode HTTP du lien (pagination POST).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl Link {
    pub fn new(rel: &str, href: impl Into<String>) -> Self {
        Self {
            rel: rel.to_string(),
            href: href.into(),
            r#type: None,
            title: None,
            method: None,
            body: None,
            merge: None,
            additional_fields: Map::new(),
        }
    }

    pub fn json(self) -> Self {
        self.media_type("application/json")
    }

    pub fn geojson(self) -> Self {
        self.media_type("application/geo+json")
    }

    pub fn media_type(mut self, media_type: &str) -> Self {
        self.r#type = Some(media_type.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

// --- ITEM ---

/// Item STAC : une Feature GeoJSON rattachée à une collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type", default = "feature_type")]
    pub r#type: String,
    #[serde(default = "default_stac_version")]
    pub stac_version: String,
    pub id: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Toujours recalculés côté serveur.
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub assets: Map<String, Value>,
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl Item {
    pub fn new(id: &str, collection: &str) -> Self {
        Self {
            r#type: feature_type(),
            stac_version: default_stac_version(),
            id: id.to_string(),
            collection: collection.to_string(),
            geometry: None,
            bbox: None,
            properties: Map::new(),
            links: Vec::new(),
            assets: Map::new(),
            additional_fields: Map::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

// --- COLLECTION ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "type", default = "collection_type")]
    pub r#type: String,
    #[serde(default = "default_stac_version")]
    pub stac_version: String,
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    /// `license`, `extent`, `keywords`, `providers`, `summaries`...
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl Collection {
    pub fn new(id: &str, description: &str) -> Self {
        Self {
            r#type: collection_type(),
            stac_version: default_stac_version(),
            id: id.to_string(),
            description: description.to_string(),
            title: None,
            links: Vec::new(),
            additional_fields: Map::new(),
        }
    }
}

// --- ENVELOPPES DE RÉPONSE ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    pub collections: Vec<Collection>,
    pub links: Vec<Link>,
}

/// Extension Context : volumes de la page courante.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub returned: u64,
    pub limit: u64,
    pub matched: u64,
}

/// Page de résultats. Les features restent des objets JSON bruts :
/// l'extension Fields peut en avoir retiré des champs obligatoires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub r#type: String,
    pub features: Vec<Map<String, Value>>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    #[serde(rename = "numberMatched", skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<u64>,
    #[serde(rename = "numberReturned", skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<u64>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Map<String, Value>>) -> Self {
        Self {
            r#type: "FeatureCollection".to_string(),
            features,
            links: Vec::new(),
            context: None,
            number_matched: None,
            number_returned: None,
        }
    }
}

/// Page d'accueil (Catalog racine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingPage {
    #[serde(rename = "type")]
    pub r#type: String,
    pub stac_version: String,
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conformance {
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
}

/// Classes de conformité annoncées.
pub const CONFORMANCE_CLASSES: &[&str] = &[
    "https://api.stacspec.org/v1.0.0/core",
    "https://api.stacspec.org/v1.0.0/collections",
    "https://api.stacspec.org/v1.0.0/ogcapi-features",
    "https://api.stacspec.org/v1.0.0/ogcapi-features/extensions/transaction",
    "https://api.stacspec.org/v1.0.0/item-search",
    "https://api.stacspec.org/v1.0.0/item-search#query",
    "https://api.stacspec.org/v1.0.0/item-search#sort",
    "https://api.stacspec.org/v1.0.0/item-search#fields",
    "https://api.stacspec.org/v1.0.0-rc.2/item-search#context",
    "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/core",
    "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/oas30",
    "http://www.opengis.net/spec/ogcapi-features-1/1.0/conf/geojson",
];

pub fn conformance_classes() -> Vec<String> {
    CONFORMANCE_CLASSES.iter().map(|c| c.to_string()).collect()
}
