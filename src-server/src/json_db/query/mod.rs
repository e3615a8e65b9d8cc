//! Moteur de requêtes JSON

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod cursor;
pub mod executor;
pub mod optimizer;
pub mod spatial;

pub use cursor::Cursor;
pub use executor::QueryEngine;

use crate::json_db::collections::StoredDocument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    pub filter: Option<QueryFilter>,
    #[serde(default)]
    pub sort: Vec<SortField>,
    pub limit: Option<usize>,
    /// Reprise après cette position (pagination keyset).
    pub after: Option<Cursor>,
    pub projection: Option<Projection>,
}

impl Query {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            filter: None,
            sort: Vec::new(),
            limit: None,
            after: None,
            projection: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub operator: FilterOperator,
    pub conditions: Vec<Condition>,
}

impl QueryFilter {
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self {
            operator: FilterOperator::And,
            conditions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: &str, operator: ComparisonOperator, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value,
        }
    }

    pub fn eq(field: &str, value: Value) -> Self {
        Self::new(field, ComparisonOperator::Eq, value)
    }

    pub fn gte(field: &str, value: Value) -> Self {
        Self::new(field, ComparisonOperator::Gte, value)
    }

    pub fn lte(field: &str, value: Value) -> Self {
        Self::new(field, ComparisonOperator::Lte, value)
    }

    pub fn is_in(field: &str, values: Vec<Value>) -> Self {
        Self::new(field, ComparisonOperator::In, Value::Array(values))
    }

    pub fn intersects(field: &str, geometry: Value) -> Self {
        Self::new(field, ComparisonOperator::GeoIntersects, geometry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
    StartsWith,
    EndsWith,
    GeoIntersects,
}

impl ComparisonOperator {
    /// Nom tel qu'il apparaît dans les filtres `query` (`eq`, `startsWith`...).
    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_string())).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub documents: Vec<StoredDocument>,
    /// Nombre de documents correspondant au filtre, avant curseur et limite.
    pub total_count: u64,
    /// Position du dernier document rendu, si d'autres suivent.
    pub next: Option<Cursor>,
}
