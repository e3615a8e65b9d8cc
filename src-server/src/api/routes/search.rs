// FICHIER : src-server/src/api/routes/search.rs

use crate::api::extract::{json_body, BaseUrl};
use crate::api::state::ApiState;
use crate::stac::client::NextLinkStyle;
use crate::stac::models::FeatureCollection;
use crate::stac::search::{GetSearchParams, SearchRequest};
use crate::utils::{AppError, Result};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, RawQuery, State};
use axum::Json;
use serde_json::Value;

/// GET /search : même traduction que POST, paramètres en query string.
pub async fn get_search(
    State(state): State<ApiState>,
    params: std::result::Result<Query<GetSearchParams>, QueryRejection>,
    RawQuery(raw): RawQuery,
    base_url: BaseUrl,
) -> Result<Json<FeatureCollection>> {
    let Query(params) = params
        .map_err(|e| AppError::Validation(format!("paramètres invalides : {}", e.body_text())))?;
    // Paramètres d'origine, reportés tels quels dans le lien `next`
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
        .into_owned()
        .collect();

    let request = params.into_request()?;
    Ok(Json(
        state
            .core
            .search(request, NextLinkStyle::Get { params: pairs }, base_url.as_str())
            .await?,
    ))
}

pub async fn post_search(
    State(state): State<ApiState>,
    base_url: BaseUrl,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<FeatureCollection>> {
    let body: Value = json_body(payload)?;
    let request = SearchRequest::from_value(body)?;
    Ok(Json(
        state
            .core
            .search(request, NextLinkStyle::Post, base_url.as_str())
            .await?,
    ))
}
