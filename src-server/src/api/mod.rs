// FICHIER : src-server/src/api/mod.rs

// =========================================================================
//  COUCHE HTTP : routes STAC, extracteurs, conversion des erreurs
// =========================================================================

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::ApiState;
