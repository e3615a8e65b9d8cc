// FICHIER : src-server/src/utils/json.rs

use crate::utils::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

// --- RE-EXPORTS (Single Source of Truth pour le JSON) ---
pub use serde_json::{json, Map, Value};

pub fn parse_bytes<T: DeserializeOwned>(b: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(b)?)
}

pub fn to_bytes<T: Serialize>(v: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(v)?)
}

pub fn from_value<T: DeserializeOwned>(v: Value) -> Result<T> {
    Ok(serde_json::from_value(v)?)
}

pub fn to_value<T: Serialize>(v: T) -> Result<Value> {
    Ok(serde_json::to_value(v)?)
}

/// Accès par chemin pointé (`properties.eo:cloud_cover`).
/// Un segment numérique indexe un tableau.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Supprime la valeur au chemin pointé. Renvoie vrai si quelque chose a été retiré.
pub fn remove_path(value: &mut Value, path: &str) -> bool {
    match path.rsplit_once('.') {
        None => value
            .as_object_mut()
            .map(|m| m.remove(path).is_some())
            .unwrap_or(false),
        Some((parent, leaf)) => {
            let mut current = value;
            for segment in parent.split('.') {
                current = match current.get_mut(segment) {
                    Some(v) => v,
                    None => return false,
                };
            }
            current
                .as_object_mut()
                .map(|m| m.remove(leaf).is_some())
                .unwrap_or(false)
        }
    }
}

/// Écrit `new_value` au chemin pointé en créant les objets intermédiaires.
pub fn set_path(value: &mut Value, path: &str, new_value: Value) {
    let mut current = value;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), new_value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
