// FICHIER : src-server/src/api/extract.rs

use crate::api::state::ApiState;
use crate::utils::config::normalize_base_url;
use crate::utils::{AppError, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequestParts;
use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

/// URL de base des liens générés (toujours terminée par `/`).
///
/// `STAC_BASE_URL` si configurée, sinon `{X-Forwarded-Proto|http}://{Host}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(pub String);

impl BaseUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim())
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<ApiState> for BaseUrl {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> std::result::Result<Self, Self::Rejection> {
        if let Some(configured) = &state.base_url {
            return Ok(BaseUrl(configured.clone()));
        }

        let scheme = header(parts, FORWARDED_PROTO).unwrap_or("http");
        let host = header(parts, FORWARDED_HOST)
            .or_else(|| header(parts, HOST.as_str()))
            .or_else(|| parts.uri.authority().map(|a| a.as_str()))
            .ok_or_else(|| AppError::Validation("en-tête Host absent".to_string()))?;

        Ok(BaseUrl(normalize_base_url(format!("{}://{}", scheme, host))))
    }
}

/// Corps JSON décodé en `T` ; toute erreur de forme devient une erreur de validation.
pub fn json_body<T: DeserializeOwned>(
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<T> {
    let Json(value) =
        payload.map_err(|e| AppError::Validation(format!("corps JSON invalide : {}", e.body_text())))?;
    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("corps JSON invalide : {}", e)))
}
