// FICHIER : src-server/src/lib.rs

//! Serveur STAC API adossé à une base documentaire JSON embarquée.

pub mod api;
pub mod json_db;
pub mod stac;
pub mod utils;
