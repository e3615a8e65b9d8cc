// FICHIER : src-server/src/utils/fs.rs

use crate::utils::{json, AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

// --- RE-EXPORTS (Isolation de la couche OS) ---
pub use std::path::{Path, PathBuf};

fn io_context(e: std::io::Error, action: &str, path: &Path) -> AppError {
    AppError::Io(std::io::Error::new(
        e.kind(),
        format!("{} {:?} : {}", action, path, e),
    ))
}

pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

pub async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| io_context(e, "création du dossier", path))
}

#[instrument(skip(path), fields(path = ?path))]
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read(path)
        .await
        .map_err(|e| io_context(e, "lecture", path))?;
    json::parse_bytes(&content)
}

/// Lecture tolérante : `None` si le fichier n'existe pas.
pub async fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path).await {
        Ok(content) => Ok(Some(json::parse_bytes(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_context(e, "lecture", path)),
    }
}

// --- ÉCRITURE ATOMIQUE ---

/// Écrit dans un fichier temporaire voisin, synchronise puis renomme.
/// Un lecteur concurrent voit l'ancienne ou la nouvelle version, jamais un fichier partiel.
#[instrument(skip(content, path), fields(path = ?path))]
pub async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let tmp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
    let mut file = fs::File::create(&tmp_path)
        .await
        .map_err(|e| io_context(e, "création du temporaire", &tmp_path))?;

    file.write_all(content)
        .await
        .map_err(|e| io_context(e, "écriture", &tmp_path))?;
    file.flush().await.ok();
    file.sync_all().await.ok();
    drop(file);

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(io_context(e, "renommage atomique vers", path));
    }
    Ok(())
}

pub async fn write_json_atomic<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let content = json::to_bytes(data)?;
    write_atomic(path, &content).await
}

/// Suppression idempotente : un fichier absent n'est pas une erreur.
pub async fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_context(e, "suppression", path)),
    }
}

/// Liste les noms de fichiers portant l'extension donnée, triés.
pub async fn list_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_context(e, "lecture du dossier", dir)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| io_context(e, "parcours du dossier", dir))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some(extension) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
