// FICHIER : src-server/src/api/routes/items.rs

use crate::api::extract::{json_body, BaseUrl};
use crate::api::state::ApiState;
use crate::stac::models::{FeatureCollection, Item};
use crate::stac::search::{parse_limit, ItemsParams};
use crate::utils::{AppError, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

/// Rattache l'item au chemin ; une collection contradictoire est refusée.
fn bind_collection(item: &mut Item, collection_id: &str) -> Result<()> {
    if item.collection.is_empty() {
        item.collection = collection_id.to_string();
    }
    if item.collection != collection_id {
        return Err(AppError::Validation(format!(
            "collection du corps ('{}') différente du chemin ('{}')",
            item.collection, collection_id
        )));
    }
    Ok(())
}

pub async fn list(
    State(state): State<ApiState>,
    Path(collection_id): Path<String>,
    Query(params): Query<ItemsParams>,
    base_url: BaseUrl,
) -> Result<Json<FeatureCollection>> {
    let limit = parse_limit(params.limit.as_deref())?;
    Ok(Json(
        state
            .core
            .list_items(&collection_id, limit, params.token, base_url.as_str())
            .await?,
    ))
}

pub async fn get_one(
    State(state): State<ApiState>,
    Path((collection_id, item_id)): Path<(String, String)>,
    base_url: BaseUrl,
) -> Result<Json<Item>> {
    Ok(Json(
        state
            .core
            .get_item(&item_id, &collection_id, base_url.as_str())
            .await?,
    ))
}

pub async fn create(
    State(state): State<ApiState>,
    Path(collection_id): Path<String>,
    base_url: BaseUrl,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>)> {
    let mut item: Item = json_body(payload)?;
    bind_collection(&mut item, &collection_id)?;
    let created = state
        .transactions
        .create_item(item, base_url.as_str())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<ApiState>,
    Path((collection_id, item_id)): Path<(String, String)>,
    base_url: BaseUrl,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Item>> {
    let mut item: Item = json_body(payload)?;
    bind_collection(&mut item, &collection_id)?;
    if item.id != item_id {
        return Err(AppError::Validation(format!(
            "id du corps ('{}') différent du chemin ('{}')",
            item.id, item_id
        )));
    }
    Ok(Json(
        state
            .transactions
            .update_item(item, base_url.as_str())
            .await?,
    ))
}

pub async fn delete(
    State(state): State<ApiState>,
    Path((collection_id, item_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    state
        .transactions
        .delete_item(&item_id, &collection_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
