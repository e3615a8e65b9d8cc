// FICHIER : src-server/src/json_db/indexes/mod.rs

pub mod manager;

use serde::{Deserialize, Serialize};

pub use manager::IndexManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Index ordonné (dates, nombres, tris).
    #[serde(rename = "1")]
    Ascending,

    /// Index géographique : le champ doit contenir une géométrie GeoJSON ou une bbox.
    #[serde(rename = "2dsphere")]
    Geo2dSphere,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Ascending => "1",
            IndexKind::Geo2dSphere => "2dsphere",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    pub kind: IndexKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub keys: Vec<IndexKey>,
}

impl IndexDefinition {
    /// Le nom suit la convention `<champ>_<type>` jointe par `_`.
    pub fn new(keys: Vec<IndexKey>) -> Self {
        let name = keys
            .iter()
            .map(|k| format!("{}_{}", k.field, k.kind.as_str()))
            .collect::<Vec<_>>()
            .join("_");
        Self { name, keys }
    }

    pub fn ascending(field: &str) -> Self {
        Self::new(vec![IndexKey {
            field: field.to_string(),
            kind: IndexKind::Ascending,
        }])
    }

    pub fn geo(field: &str) -> Self {
        Self::new(vec![IndexKey {
            field: field.to_string(),
            kind: IndexKind::Geo2dSphere,
        }])
    }

    /// Ajoute une clé (index composé).
    pub fn then(mut self, field: &str, kind: IndexKind) -> Self {
        self.keys.push(IndexKey {
            field: field.to_string(),
            kind,
        });
        Self::new(self.keys)
    }

    pub fn geo_fields(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(|k| k.kind == IndexKind::Geo2dSphere)
            .map(|k| k.field.as_str())
    }
}

// ============================================================================
// TESTS UNITAIRES
// ============================================================================
