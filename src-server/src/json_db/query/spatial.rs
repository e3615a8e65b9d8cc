// FICHIER : src-server/src/json_db/query/spatial.rs

//! Évaluation géographique des conditions `geoIntersects`.
//!
//! Les géométries GeoJSON sont décodées par `geojson` puis converties en
//! `geo::Geometry` (avec contrôle des positions), les bbox STAC (4 ou 6
//! nombres) deviennent des polygones.

use crate::utils::{AppError, Result};
use geo::{BoundingRect, Coord, Geometry, Intersects, LineString, Point, Polygon};
use serde_json::{json, Value};

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Décode une valeur de champ géographique : objet GeoJSON ou tableau bbox.
pub fn parse_geo_value(value: &Value) -> Result<Geometry<f64>> {
    match value {
        Value::Array(_) => {
            let bbox = parse_bbox(value)?;
            parse_geometry(&bbox_geojson(&bbox))
        }
        Value::Object(_) => parse_geometry(value),
        other => Err(invalid(format!(
            "géométrie attendue (objet GeoJSON ou bbox), reçu : {}",
            other
        ))),
    }
}

/// Décode une géométrie GeoJSON.
pub fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    let geometry = geojson::Geometry::from_json_value(value.clone())
        .map_err(|e| invalid(format!("GeoJSON invalide : {}", e)))?;
    to_geo(&geometry.value)
}

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    let (x, y) = match position {
        [x, y, ..] => (*x, *y),
        _ => return Err(invalid("une position doit avoir au moins 2 coordonnées")),
    };
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid("coordonnée non finie"));
    }
    if !(-180.0..=180.0).contains(&x) || !(-90.0..=90.0).contains(&y) {
        return Err(invalid(format!(
            "coordonnée hors limites (longitude/latitude) : [{}, {}]",
            x, y
        )));
    }
    Ok(Coord { x, y })
}

fn line(positions: &[Vec<f64>], min_len: usize) -> Result<LineString<f64>> {
    if positions.len() < min_len {
        return Err(invalid(format!(
            "au moins {} positions attendues, reçu {}",
            min_len,
            positions.len()
        )));
    }
    positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| invalid("un polygone doit avoir un anneau extérieur"))?;
    let interiors = interiors
        .iter()
        .map(|r| line(r, 4))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(line(exterior, 4)?, interiors))
}

fn to_geo(value: &geojson::Value) -> Result<Geometry<f64>> {
    use geojson::Value as G;

    let geometry = match value {
        G::Point(p) => Geometry::Point(Point::from(coord(p)?)),
        G::MultiPoint(points) => Geometry::MultiPoint(
            points
                .iter()
                .map(|p| coord(p).map(Point::from))
                .collect::<Result<Vec<_>>>()?
                .into(),
        ),
        G::LineString(positions) => Geometry::LineString(line(positions, 2)?),
        G::MultiLineString(lines) => Geometry::MultiLineString(geo::MultiLineString::new(
            lines
                .iter()
                .map(|l| line(l, 2))
                .collect::<Result<Vec<_>>>()?,
        )),
        G::Polygon(rings) => Geometry::Polygon(polygon(rings)?),
        G::MultiPolygon(polygons) => Geometry::MultiPolygon(geo::MultiPolygon::new(
            polygons
                .iter()
                .map(|p| polygon(p))
                .collect::<Result<Vec<_>>>()?,
        )),
        G::GeometryCollection(members) => Geometry::GeometryCollection(geo::GeometryCollection(
            members
                .iter()
                .map(|g| to_geo(&g.value))
                .collect::<Result<Vec<_>>>()?,
        )),
    };
    Ok(geometry)
}

/// Lit une bbox STAC (4 ou 6 nombres) et la ramène à `[minx, miny, maxx, maxy]`.
pub fn parse_bbox(value: &Value) -> Result<[f64; 4]> {
    let numbers = value
        .as_array()
        .ok_or_else(|| invalid("bbox doit être un tableau"))?
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| invalid("bbox ne doit contenir que des nombres")))
        .collect::<Result<Vec<f64>>>()?;
    normalize_bbox(&numbers)
}

pub fn normalize_bbox(numbers: &[f64]) -> Result<[f64; 4]> {
    let bbox = match numbers {
        [minx, miny, maxx, maxy] => [*minx, *miny, *maxx, *maxy],
        [minx, miny, _minz, maxx, maxy, _maxz] => [*minx, *miny, *maxx, *maxy],
        _ => {
            return Err(invalid(format!(
                "bbox doit contenir 4 ou 6 nombres, reçu {}",
                numbers.len()
            )))
        }
    };
    if bbox[1] > bbox[3] {
        return Err(invalid(format!(
            "bbox : miny ({}) supérieur à maxy ({})",
            bbox[1], bbox[3]
        )));
    }
    Ok(bbox)
}

/// Géométrie GeoJSON couvrant une bbox.
///
/// `minx > maxx` traverse l'antiméridien : la bbox est coupée en deux
/// polygones (MultiPolygon). Une bbox dégénérée devient un Point ou une LineString.
pub fn bbox_geojson(bbox: &[f64; 4]) -> Value {
    let [minx, miny, maxx, maxy] = *bbox;
    let ring = |x0: f64, x1: f64| json!([[[x0, miny], [x1, miny], [x1, maxy], [x0, maxy], [x0, miny]]]);

    if minx > maxx {
        return json!({
            "type": "MultiPolygon",
            "coordinates": [ring(minx, 180.0), ring(-180.0, maxx)]
        });
    }
    match (minx == maxx, miny == maxy) {
        (true, true) => json!({ "type": "Point", "coordinates": [minx, miny] }),
        (true, false) | (false, true) => json!({
            "type": "LineString",
            "coordinates": [[minx, miny], [maxx, maxy]]
        }),
        (false, false) => json!({ "type": "Polygon", "coordinates": ring(minx, maxx) }),
    }
}

/// Vrai si le champ du document intersecte la géométrie de requête.
/// Un champ absent ou illisible ne correspond jamais.
pub fn intersects(field: Option<&Value>, query: &Geometry<f64>) -> bool {
    match field {
        None | Some(Value::Null) => false,
        Some(value) => parse_geo_value(value)
            .map(|geometry| geometry.intersects(query))
            .unwrap_or(false),
    }
}

/// Emprise `[minx, miny, maxx, maxy]` d'une géométrie GeoJSON.
pub fn bounding_box(geometry: &Value) -> Result<Option<Vec<f64>>> {
    let geometry = parse_geometry(geometry)?;
    Ok(geometry
        .bounding_rect()
        .map(|r| vec![r.min().x, r.min().y, r.max().x, r.max().y]))
}
