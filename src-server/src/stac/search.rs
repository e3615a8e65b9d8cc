// FICHIER : src-server/src/stac/search.rs

//! Requête de recherche STAC : corps POST, paramètres GET et leur
//! normalisation vers une forme unique avant traduction.

use crate::utils::json::{Map, Value};
use crate::utils::{AppError, Result};
use chrono::{DateTime, FixedOffset};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Filtre `query` : propriété → { opérateur → valeur }.
pub type QueryExpr = Map<String, Value>;

/// Corps d'une recherche POST (forme normalisée, partagée avec GET).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersects: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Accepte un objet ou une chaîne JSON contenant cet objet.
    #[serde(
        deserialize_with = "deserialize_query",
        skip_serializing_if = "Option::is_none"
    )]
    pub query: Option<QueryExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortby: Option<Vec<SortBy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,
}

impl SearchRequest {
    /// Décode un corps JSON ; toute erreur de forme est une erreur de validation.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("requête de recherche invalide : {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fields {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

// --- NORMALISATION DE `query` ---

fn deserialize_query<'de, D>(deserializer: D) -> std::result::Result<Option<QueryExpr>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(expr)) => Ok(Some(expr)),
        Some(Value::String(raw)) => parse_query(&raw).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!(
            "'query' doit être un objet ou une chaîne JSON, reçu {}",
            other
        ))),
    }
}

/// Décode la forme texte de `query`. Une chaîne vide vaut « pas de filtre ».
pub fn parse_query(raw: &str) -> Result<Option<QueryExpr>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(expr)) => Ok(Some(expr)),
        Ok(_) => Err(AppError::Validation(
            "'query' doit encoder un objet JSON".to_string(),
        )),
        Err(e) => Err(AppError::Validation(format!("'query' illisible : {}", e))),
    }
}

// --- PARAMÈTRES GET ---

/// Paramètres de `GET /search`, tels que reçus dans la query string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GetSearchParams {
    pub collections: Option<String>,
    pub ids: Option<String>,
    pub bbox: Option<String>,
    pub intersects: Option<String>,
    pub datetime: Option<String>,
    pub limit: Option<String>,
    pub query: Option<String>,
    pub token: Option<String>,
    pub fields: Option<String>,
    pub sortby: Option<String>,
}

impl GetSearchParams {
    pub fn into_request(self) -> Result<SearchRequest> {
        Ok(SearchRequest {
            collections: self.collections.as_deref().map(split_list),
            ids: self.ids.as_deref().map(split_list),
            bbox: self.bbox.as_deref().map(parse_bbox_param).transpose()?,
            intersects: self
                .intersects
                .as_deref()
                .map(|raw| {
                    serde_json::from_str(raw).map_err(|e| {
                        AppError::Validation(format!("'intersects' illisible : {}", e))
                    })
                })
                .transpose()?,
            datetime: self.datetime.filter(|d| !d.trim().is_empty()),
            limit: parse_limit(self.limit.as_deref())?,
            query: match self.query.as_deref() {
                Some(raw) => parse_query(raw)?,
                None => None,
            },
            token: self.token.filter(|t| !t.is_empty()),
            sortby: self.sortby.as_deref().map(parse_sortby),
            fields: self.fields.as_deref().map(parse_fields),
        })
    }
}

/// Paramètres de `GET /collections/{id}/items`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemsParams {
    pub limit: Option<String>,
    pub token: Option<String>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn parse_limit(raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("limit invalide : '{}'", s))),
    }
}

fn parse_bbox_param(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|n| {
            n.trim()
                .parse::<f64>()
                .map_err(|_| AppError::Validation(format!("bbox invalide : '{}'", raw)))
        })
        .collect()
}

/// `+properties.datetime,-id` (sans préfixe : croissant).
pub fn parse_sortby(raw: &str) -> Vec<SortBy> {
    split_list(raw)
        .into_iter()
        .map(|spec| match spec.strip_prefix('-') {
            Some(field) => SortBy {
                field: field.to_string(),
                direction: SortDirection::Desc,
            },
            None => SortBy {
                field: spec.trim_start_matches('+').to_string(),
                direction: SortDirection::Asc,
            },
        })
        .collect()
}

/// `id,properties.datetime,-assets`.
pub fn parse_fields(raw: &str) -> Fields {
    let mut fields = Fields::default();
    for spec in split_list(raw) {
        match spec.strip_prefix('-') {
            Some(path) => fields.exclude.push(path.to_string()),
            None => fields.include.push(spec.trim_start_matches('+').to_string()),
        }
    }
    fields
}

// --- DATETIME ---

/// Filtre temporel : un instant ou un intervalle (bornes ouvertes possibles).
#[derive(Debug, Clone, PartialEq)]
pub enum DatetimeFilter {
    Instant(String),
    Interval {
        start: Option<String>,
        end: Option<String>,
    },
}

fn parse_instant(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .map_err(|_| AppError::Validation(format!("datetime non RFC 3339 : '{}'", raw)))
}

fn open_bound(raw: &str) -> Result<Option<String>> {
    match raw.trim() {
        "" | ".." => Ok(None),
        s => {
            parse_instant(s)?;
            Ok(Some(s.to_string()))
        }
    }
}

pub fn parse_datetime(raw: &str) -> Result<DatetimeFilter> {
    let raw = raw.trim();
    let Some((start, end)) = raw.split_once('/') else {
        parse_instant(raw)?;
        return Ok(DatetimeFilter::Instant(raw.to_string()));
    };

    let start = open_bound(start)?;
    let end = open_bound(end)?;
    match (&start, &end) {
        (None, None) => Err(AppError::Validation(format!(
            "intervalle datetime sans borne : '{}'",
            raw
        ))),
        (Some(s), Some(e)) if parse_instant(s)? > parse_instant(e)? => Err(AppError::Validation(
            format!("intervalle datetime inversé : '{}'", raw),
        )),
        _ => Ok(DatetimeFilter::Interval { start, end }),
    }
}
