// FICHIER : src-server/src/stac/translator.rs

//! Traduction d'une recherche STAC en requête native du magasin documentaire.
//!
//! Fonction pure : aucune I/O, toutes les erreurs de forme sont levées ici,
//! avant le moindre accès au stockage.

use crate::json_db::query::{
    spatial, ComparisonOperator, Condition, Cursor, Projection, Query, QueryFilter, SortField,
    SortOrder,
};
use crate::stac::search::{self, DatetimeFilter, Fields, SearchRequest, SortBy, SortDirection};
use crate::utils::json::Value;
use crate::utils::{AppError, Result};

/// Champs de premier niveau d'un item ; tout autre nom désigne une propriété.
const ITEM_TOP_LEVEL_FIELDS: &[&str] = &[
    "id",
    "collection",
    "type",
    "stac_version",
    "geometry",
    "bbox",
    "links",
    "assets",
];

/// Résultat de la traduction, transmis tel quel au client de lecture.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedSearch {
    /// `None` : tout correspond.
    pub filter: Option<QueryFilter>,
    pub limit: usize,
    pub after: Option<Cursor>,
    pub sort: Vec<SortField>,
    pub projection: Option<Projection>,
}

impl TranslatedSearch {
    pub fn into_query(self, collection: &str) -> Query {
        let mut query = Query::new(collection);
        query.filter = self.filter;
        query.limit = Some(self.limit);
        query.after = self.after;
        query.sort = self.sort;
        query.projection = self.projection;
        query
    }
}

pub fn translate(request: &SearchRequest, default_limit: usize) -> Result<TranslatedSearch> {
    let limit = effective_limit(request.limit, default_limit)?;
    let mut conditions = Vec::new();

    if let Some(collections) = request.collections.as_ref().filter(|c| !c.is_empty()) {
        conditions.push(membership("collection", collections));
    }
    if let Some(ids) = request.ids.as_ref().filter(|i| !i.is_empty()) {
        conditions.push(membership("id", ids));
    }

    if let Some(bbox) = &request.bbox {
        let bbox = spatial::normalize_bbox(bbox)?;
        conditions.push(Condition::intersects("bbox", spatial::bbox_geojson(&bbox)));
    }

    // Géométrie transmise telle quelle : le stockage la rejette si elle est invalide
    if let Some(geometry) = &request.intersects {
        conditions.push(Condition::intersects("geometry", geometry.clone()));
    }

    if let Some(datetime) = &request.datetime {
        conditions.extend(datetime_conditions(&search::parse_datetime(datetime)?));
    }

    if let Some(query) = &request.query {
        for (name, expr) in query {
            conditions.extend(property_conditions(name, expr)?);
        }
    }

    let after = request.token.as_deref().map(Cursor::decode).transpose()?;

    Ok(TranslatedSearch {
        filter: (!conditions.is_empty()).then(|| QueryFilter::and(conditions)),
        limit,
        after,
        sort: request.sortby.as_deref().map(sort_fields).unwrap_or_default(),
        projection: request.fields.as_ref().and_then(projection),
    })
}

/// Limite effective ; une limite nulle ou négative est refusée.
pub fn effective_limit(limit: Option<i64>, default_limit: usize) -> Result<usize> {
    match limit {
        None => Ok(default_limit),
        Some(n) if n <= 0 => Err(AppError::Validation(format!(
            "limit doit être strictement positif (reçu {})",
            n
        ))),
        Some(n) => usize::try_from(n)
            .map_err(|_| AppError::Validation(format!("limit hors bornes : {}", n))),
    }
}

fn membership(field: &str, values: &[String]) -> Condition {
    match values {
        [single] => Condition::eq(field, Value::String(single.clone())),
        _ => Condition::is_in(
            field,
            values.iter().cloned().map(Value::String).collect(),
        ),
    }
}

fn datetime_conditions(filter: &DatetimeFilter) -> Vec<Condition> {
    const FIELD: &str = "properties.datetime";
    match filter {
        DatetimeFilter::Instant(at) => vec![Condition::eq(FIELD, Value::String(at.clone()))],
        DatetimeFilter::Interval { start, end } => start
            .iter()
            .map(|s| Condition::gte(FIELD, Value::String(s.clone())))
            .chain(end.iter().map(|e| Condition::lte(FIELD, Value::String(e.clone()))))
            .collect(),
    }
}

/// `{"eo:cloud_cover": {"gte": 2, "lte": 4}}` : un prédicat par couple opérateur/valeur.
fn property_conditions(name: &str, expr: &Value) -> Result<Vec<Condition>> {
    let field = format!("properties.{}", name);
    let operators = expr.as_object().ok_or_else(|| {
        AppError::Validation(format!(
            "le filtre de '{}' doit associer des opérateurs à des valeurs",
            name
        ))
    })?;

    operators
        .iter()
        .map(|(op, value)| {
            let operator = query_operator(op).ok_or_else(|| {
                AppError::Validation(format!("opérateur inconnu '{}' sur le champ '{}'", op, name))
            })?;
            Ok(Condition::new(&field, operator, value.clone()))
        })
        .collect()
}

fn query_operator(name: &str) -> Option<ComparisonOperator> {
    match name {
        "neq" => Some(ComparisonOperator::Ne),
        // Le spatial passe par `intersects` et `bbox`
        "geoIntersects" => None,
        other => ComparisonOperator::from_name(other),
    }
}

fn resolve_field(field: &str) -> String {
    if ITEM_TOP_LEVEL_FIELDS.contains(&field) || field.starts_with("properties.") {
        field.to_string()
    } else {
        format!("properties.{}", field)
    }
}

fn sort_fields(sortby: &[SortBy]) -> Vec<SortField> {
    sortby
        .iter()
        .map(|s| SortField {
            field: resolve_field(&s.field),
            order: match s.direction {
                SortDirection::Asc => SortOrder::Asc,
                SortDirection::Desc => SortOrder::Desc,
            },
        })
        .collect()
}

fn projection(fields: &Fields) -> Option<Projection> {
    if !fields.include.is_empty() {
        let kept = fields
            .include
            .iter()
            .filter(|f| !fields.exclude.contains(f))
            .cloned()
            .collect();
        return Some(Projection::Include(kept));
    }
    (!fields.exclude.is_empty()).then(|| Projection::Exclude(fields.exclude.clone()))
}
