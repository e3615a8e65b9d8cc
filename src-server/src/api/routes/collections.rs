// FICHIER : src-server/src/api/routes/collections.rs

use crate::api::extract::{json_body, BaseUrl};
use crate::api::state::ApiState;
use crate::stac::models::{Collection, Collections};
use crate::utils::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

pub async fn list(State(state): State<ApiState>, base_url: BaseUrl) -> Result<Json<Collections>> {
    Ok(Json(state.core.list_collections(base_url.as_str()).await?))
}

pub async fn get_one(
    State(state): State<ApiState>,
    Path(collection_id): Path<String>,
    base_url: BaseUrl,
) -> Result<Json<Collection>> {
    Ok(Json(
        state
            .core
            .get_collection(&collection_id, base_url.as_str())
            .await?,
    ))
}

/// POST /collections : 201, ou 409 si l'id existe déjà.
pub async fn create(
    State(state): State<ApiState>,
    base_url: BaseUrl,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Collection>)> {
    let collection: Collection = json_body(payload)?;
    let created = state
        .transactions
        .create_collection(collection, base_url.as_str())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<ApiState>,
    base_url: BaseUrl,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Collection>> {
    let collection: Collection = json_body(payload)?;
    Ok(Json(
        state
            .transactions
            .update_collection(collection, base_url.as_str())
            .await?,
    ))
}

pub async fn delete(
    State(state): State<ApiState>,
    Path(collection_id): Path<String>,
) -> Result<StatusCode> {
    state.transactions.delete_collection(&collection_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
