// FICHIER : src-server/src/api/routes/mod.rs

//! Routes HTTP de l'API STAC.

mod catalog;
mod collections;
mod items;
mod search;

use crate::api::state::ApiState;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        // Catalogue
        .route("/", get(catalog::landing_page))
        .route("/conformance", get(catalog::conformance))
        .route("/health", get(catalog::health))
        // Collections
        .route(
            "/collections",
            get(collections::list)
                .post(collections::create)
                .put(collections::update),
        )
        .route(
            "/collections/{collection_id}",
            get(collections::get_one).delete(collections::delete),
        )
        // Items
        .route(
            "/collections/{collection_id}/items",
            get(items::list).post(items::create),
        )
        .route(
            "/collections/{collection_id}/items/{item_id}",
            get(items::get_one).put(items::update).delete(items::delete),
        )
        // Recherche
        .route("/search", get(search::get_search).post(search::post_search))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
