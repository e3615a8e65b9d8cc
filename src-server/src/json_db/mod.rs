// FICHIER : src-server/src/json_db/mod.rs

//! Magasin documentaire JSON embarqué : un fichier par document,
//! requêtes en mémoire, transactions multi-documents journalisées.

pub mod collections;
pub mod indexes;
pub mod query;
pub mod storage;
pub mod transactions;
