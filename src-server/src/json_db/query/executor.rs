// FICHIER : src-server/src/json_db/query/executor.rs

use crate::json_db::collections::{CollectionsManager, StoredDocument};
use crate::json_db::query::{
    optimizer::QueryOptimizer, spatial, ComparisonOperator, Condition, Cursor, FilterOperator,
    Projection, Query, QueryFilter, QueryResult, SortField, SortOrder,
};
use crate::utils::json::{self, Map, Value};
use crate::utils::{AppError, Result};
use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;
use tracing::debug;

/// Champs conservés par toute projection (identité du document).
const ALWAYS_KEPT: [&str; 3] = ["id", "collection", "type"];

/// Condition prête à l'évaluation : les géométries de requête sont décodées une seule fois.
enum CompiledCondition<'q> {
    Plain(&'q Condition),
    Geo {
        field: &'q str,
        geometry: geo::Geometry<f64>,
    },
}

struct CompiledFilter<'q> {
    operator: FilterOperator,
    conditions: Vec<CompiledCondition<'q>>,
}

// --- MOTEUR DE REQUÊTE ---

pub struct QueryEngine<'a> {
    manager: &'a CollectionsManager<'a>,
}

impl<'a> QueryEngine<'a> {
    pub fn new(manager: &'a CollectionsManager<'a>) -> Self {
        Self { manager }
    }

    pub async fn execute_query(&self, query: Query) -> Result<QueryResult> {
        let query = QueryOptimizer::new().optimize(query);

        // 1. VALIDATION (avant toute I/O)
        let compiled = query.filter.as_ref().map(compile_filter).transpose()?;
        if let Some(after) = &query.after {
            if after.sort_values.len() != query.sort.len() {
                return Err(AppError::Validation(format!(
                    "jeton de pagination incompatible avec le tri demandé ({} clés attendues, {} reçues)",
                    query.sort.len(),
                    after.sort_values.len()
                )));
            }
        }

        // 2. CHARGEMENT
        let mut documents = self.manager.list_all(&query.collection).await?;

        // 3. FILTRAGE
        if let Some(filter) = &compiled {
            documents.retain(|doc| evaluate_filter(&doc.document, filter));
        }

        // 4. TRI (ordre total : champs demandés puis clé de stockage)
        documents.sort_by(|a, b| compare_docs(a, b, &query.sort));
        let total_count = documents.len() as u64;

        // 5. PAGINATION (keyset)
        let start = match &query.after {
            Some(cursor) => documents
                .partition_point(|d| compare_to_cursor(d, cursor, &query.sort) != Ordering::Greater),
            None => 0,
        };
        let remaining = documents.len() - start;
        let limit = query.limit.unwrap_or(remaining);
        let mut page: Vec<StoredDocument> = documents.into_iter().skip(start).take(limit).collect();

        let next = if remaining > page.len() {
            page.last().map(|d| cursor_for(d, &query.sort))
        } else {
            None
        };

        // 6. PROJECTION
        if let Some(projection) = &query.projection {
            for doc in &mut page {
                doc.document = project_fields(&doc.document, projection);
            }
        }

        debug!(
            "🔎 '{}' : {} correspondances, {} rendus",
            query.collection,
            total_count,
            page.len()
        );

        Ok(QueryResult {
            documents: page,
            total_count,
            next,
        })
    }
}

// --- COMPILATION ---

fn compile_filter(filter: &QueryFilter) -> Result<CompiledFilter<'_>> {
    let conditions = filter
        .conditions
        .iter()
        .map(|c| match c.operator {
            ComparisonOperator::GeoIntersects => Ok(CompiledCondition::Geo {
                field: &c.field,
                geometry: spatial::parse_geo_value(&c.value)?,
            }),
            ComparisonOperator::In if !c.value.is_array() => Err(AppError::Validation(format!(
                "l'opérateur 'in' sur '{}' attend un tableau",
                c.field
            ))),
            _ => Ok(CompiledCondition::Plain(c)),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledFilter {
        operator: filter.operator,
        conditions,
    })
}

// --- ÉVALUATION ---

fn evaluate_filter(document: &Value, filter: &CompiledFilter<'_>) -> bool {
    let mut results = filter
        .conditions
        .iter()
        .map(|c| evaluate_compiled(document, c));
    match filter.operator {
        FilterOperator::And => results.all(|r| r),
        FilterOperator::Or => results.any(|r| r),
        FilterOperator::Not => !results.any(|r| r),
    }
}

fn evaluate_compiled(document: &Value, condition: &CompiledCondition<'_>) -> bool {
    match condition {
        CompiledCondition::Geo { field, geometry } => {
            spatial::intersects(json::get_path(document, field), geometry)
        }
        CompiledCondition::Plain(c) => evaluate_condition(document, c),
    }
}

/// Évalue une condition sur un document.
///
/// `contains`, `startsWith` et `endsWith` ignorent la casse des deux côtés.
/// Les comparaisons d'ordre ne portent que sur des valeurs de même nature.
pub fn evaluate_condition(document: &Value, condition: &Condition) -> bool {
    let val = json::get_path(document, &condition.field);
    let target = &condition.value;

    let ordered = |accept: fn(Ordering) -> bool| {
        val.and_then(|v| compare_values(v, target))
            .map(accept)
            .unwrap_or(false)
    };

    match condition.operator {
        ComparisonOperator::Eq => val.is_some_and(|v| matches_equal(v, target)),
        ComparisonOperator::Ne => !val.is_some_and(|v| matches_equal(v, target)),
        ComparisonOperator::Gt => ordered(|o| o == Ordering::Greater),
        ComparisonOperator::Gte => ordered(|o| o != Ordering::Less),
        ComparisonOperator::Lt => ordered(|o| o == Ordering::Less),
        ComparisonOperator::Lte => ordered(|o| o != Ordering::Greater),

        ComparisonOperator::In => match (val, target.as_array()) {
            (Some(v), Some(list)) => list.iter().any(|candidate| matches_equal(v, candidate)),
            _ => false,
        },

        ComparisonOperator::Contains => match (val, target) {
            (Some(Value::String(s)), Value::String(sub)) => {
                s.to_lowercase().contains(&sub.to_lowercase())
            }
            (Some(Value::Array(items)), v) => items.iter().any(|item| values_equal(item, v)),
            _ => false,
        },
        ComparisonOperator::StartsWith => match (val, target) {
            (Some(Value::String(s)), Value::String(prefix)) => {
                s.to_lowercase().starts_with(&prefix.to_lowercase())
            }
            _ => false,
        },
        ComparisonOperator::EndsWith => match (val, target) {
            (Some(Value::String(s)), Value::String(suffix)) => {
                s.to_lowercase().ends_with(&suffix.to_lowercase())
            }
            _ => false,
        },

        ComparisonOperator::GeoIntersects => spatial::parse_geo_value(target)
            .map(|geometry| spatial::intersects(val, &geometry))
            .unwrap_or(false),
    }
}

/// Égalité ; un champ tableau correspond si l'un de ses éléments est égal.
fn matches_equal(field: &Value, target: &Value) -> bool {
    if values_equal(field, target) {
        return true;
    }
    match field {
        Value::Array(items) if !target.is_array() => {
            items.iter().any(|item| values_equal(item, target))
        }
        _ => false,
    }
}

fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    if let (Some(n1), Some(n2)) = (a.as_f64(), b.as_f64()) {
        return n1 == n2;
    }
    if let (Some(s1), Some(s2)) = (a.as_str(), b.as_str()) {
        if let (Some(d1), Some(d2)) = (parse_instant(s1), parse_instant(s2)) {
            return d1 == d2;
        }
    }
    false
}

/// Comparaison de deux valeurs de même nature ; `None` si elles ne sont pas comparables.
/// Deux chaînes RFC 3339 sont comparées comme des instants.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(s1), Value::String(s2)) => match (parse_instant(s1), parse_instant(s2)) {
            (Some(d1), Some(d2)) => Some(d1.cmp(&d2)),
            _ => Some(s1.cmp(s2)),
        },
        (Value::Bool(b1), Value::Bool(b2)) => Some(b1.cmp(b2)),
        _ => None,
    }
}

// --- TRI & CURSEUR ---

/// Rang de tri : absent < booléen < nombre < instant RFC 3339 < chaîne < tableau < objet.
fn sort_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(s) if parse_instant(s).is_some() => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

/// Ordre total pour le tri et le curseur, indépendant des filtres.
/// Deux instants se comparent dans le temps puis par leur texte brut.
fn sort_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(dx), Some(dy)) => dx.cmp(&dy).then_with(|| x.cmp(y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => x.cmp(y),
        },
        _ => sort_rank(a)
            .cmp(&sort_rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

fn sort_value(doc: &Value, field: &str) -> Value {
    json::get_path(doc, field).cloned().unwrap_or(Value::Null)
}

fn oriented(order: SortOrder, cmp: Ordering) -> Ordering {
    match order {
        SortOrder::Asc => cmp,
        SortOrder::Desc => cmp.reverse(),
    }
}

fn compare_docs(a: &StoredDocument, b: &StoredDocument, sort: &[SortField]) -> Ordering {
    for s in sort {
        let cmp = sort_compare(
            &sort_value(&a.document, &s.field),
            &sort_value(&b.document, &s.field),
        );
        if cmp != Ordering::Equal {
            return oriented(s.order, cmp);
        }
    }
    a.key.cmp(&b.key)
}

fn compare_to_cursor(doc: &StoredDocument, cursor: &Cursor, sort: &[SortField]) -> Ordering {
    for (s, cursor_value) in sort.iter().zip(&cursor.sort_values) {
        let cmp = sort_compare(&sort_value(&doc.document, &s.field), cursor_value);
        if cmp != Ordering::Equal {
            return oriented(s.order, cmp);
        }
    }
    doc.key.as_str().cmp(cursor.key.as_str())
}

fn cursor_for(doc: &StoredDocument, sort: &[SortField]) -> Cursor {
    Cursor {
        key: doc.key.clone(),
        sort_values: sort
            .iter()
            .map(|s| sort_value(&doc.document, &s.field))
            .collect(),
    }
}

// --- PROJECTION ---

fn project_fields(doc: &Value, projection: &Projection) -> Value {
    match projection {
        Projection::Include(fields) if fields.is_empty() => doc.clone(),
        Projection::Include(fields) => {
            let mut projected = Value::Object(Map::new());
            for path in ALWAYS_KEPT.iter().copied().chain(fields.iter().map(String::as_str)) {
                if let Some(val) = json::get_path(doc, path) {
                    json::set_path(&mut projected, path, val.clone());
                }
            }
            projected
        }
        Projection::Exclude(fields) => {
            let mut projected = doc.clone();
            for path in fields {
                if !ALWAYS_KEPT.contains(&path.as_str()) {
                    json::remove_path(&mut projected, path);
                }
            }
            projected
        }
    }
}

// ============================================================================
// TESTS UNITAIRES
// ============================================================================
