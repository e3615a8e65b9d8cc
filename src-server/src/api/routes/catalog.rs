// FICHIER : src-server/src/api/routes/catalog.rs

use crate::api::extract::BaseUrl;
use crate::api::state::ApiState;
use crate::stac::models::{Conformance, LandingPage};
use crate::utils::Result;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET / : Catalog racine.
pub async fn landing_page(
    State(state): State<ApiState>,
    base_url: BaseUrl,
) -> Result<Json<LandingPage>> {
    Ok(Json(state.core.landing_page(base_url.as_str()).await?))
}

pub async fn conformance(State(state): State<ApiState>) -> Json<Conformance> {
    Json(state.core.conformance())
}
