use crate::utils::{AppError, Result};
use std::env;
use std::str::FromStr;

/// Récupère une variable d'environnement (Requis).
/// Renvoie une erreur explicite si la clé est manquante.
pub fn get(key: &str) -> Result<String> {
    env::var(key)
        .map_err(|_| AppError::Config(format!("Variable d'environnement manquante : {}", key)))
}

/// Récupère une variable d'environnement (Optionnel).
/// Une valeur vide est traitée comme absente.
pub fn get_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Récupère une variable d'environnement avec valeur par défaut.
pub fn get_or(key: &str, default: &str) -> String {
    get_optional(key).unwrap_or_else(|| default.to_string())
}

/// Récupère et parse une variable (ex: PORT=8080).
pub fn get_parsed<T: FromStr>(key: &str) -> Result<T> {
    let val = get(key)?;
    val.trim()
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("Impossible de parser la variable : {}", key)))
}

/// Comme `get_parsed`, mais avec une valeur par défaut si la variable est absente.
/// Une valeur présente mais invalide reste une erreur.
pub fn get_parsed_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match get_optional(key) {
        Some(_) => get_parsed(key),
        None => Ok(default),
    }
}
