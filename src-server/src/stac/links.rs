// FICHIER : src-server/src/stac/links.rs

//! Génération des liens côté serveur. Les liens fournis par un client
//! ne sont jamais conservés : ils sont recalculés depuis l'URL de base.

use crate::stac::models::Link;
use crate::utils::json::json;
use crate::utils::{AppError, Result};
use url::Url;

/// URL absolue `base/<segments...>` (chaque segment est encodé).
pub fn href(base_url: &str, segments: &[&str]) -> Result<String> {
    Ok(resolve(base_url, segments)?.to_string())
}

fn resolve(base_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::Validation(format!("URL de base invalide '{}' : {}", base_url, e)))?;
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| AppError::Validation(format!("URL de base non hiérarchique : '{}'", base_url)))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// URL racine normalisée (toujours terminée par `/`).
pub fn root_href(base_url: &str) -> Result<String> {
    let mut url = resolve(base_url, &[])?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url.to_string())
}

// --- ITEMS ---

pub struct ItemLinks<'a> {
    pub collection_id: &'a str,
    pub item_id: &'a str,
    pub base_url: &'a str,
}

impl<'a> ItemLinks<'a> {
    pub fn new(collection_id: &'a str, item_id: &'a str, base_url: &'a str) -> Self {
        Self {
            collection_id,
            item_id,
            base_url,
        }
    }

    pub fn create_links(&self) -> Result<Vec<Link>> {
        let collection = href(self.base_url, &["collections", self.collection_id])?;
        Ok(vec![
            Link::new(
                "self",
                href(
                    self.base_url,
                    &["collections", self.collection_id, "items", self.item_id],
                )?,
            )
            .geojson(),
            Link::new("parent", collection.clone()).json(),
            Link::new("collection", collection).json(),
            Link::new("root", root_href(self.base_url)?).json(),
        ])
    }
}

// --- COLLECTIONS ---

pub struct CollectionLinks<'a> {
    pub collection_id: &'a str,
    pub base_url: &'a str,
}

impl<'a> CollectionLinks<'a> {
    pub fn new(collection_id: &'a str, base_url: &'a str) -> Self {
        Self {
            collection_id,
            base_url,
        }
    }

    pub fn create_links(&self) -> Result<Vec<Link>> {
        let root = root_href(self.base_url)?;
        Ok(vec![
            Link::new("self", href(self.base_url, &["collections", self.collection_id])?).json(),
            Link::new("parent", root.clone()).json(),
            Link::new("root", root).json(),
            Link::new(
                "items",
                href(self.base_url, &["collections", self.collection_id, "items"])?,
            )
            .geojson(),
        ])
    }
}

// --- PAGINATION ---

/// Lien `next` d'une page obtenue en GET : mêmes paramètres, jeton remplacé.
pub fn next_get_link(
    base_url: &str,
    segments: &[&str],
    params: &[(String, String)],
    token: &str,
) -> Result<Link> {
    let mut url = resolve(base_url, segments)?;
    {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params.iter().filter(|(name, _)| name != "token") {
            pairs.append_pair(name, value);
        }
        pairs.append_pair("token", token);
    }
    Ok(Link::new("next", url.to_string()).geojson())
}

/// Lien `next` d'une recherche POST : le client fusionne `body` dans sa requête.
pub fn next_post_link(base_url: &str, segments: &[&str], token: &str) -> Result<Link> {
    let mut link = Link::new("next", href(base_url, segments)?).geojson();
    link.method = Some("POST".to_string());
    link.body = Some(json!({ "token": token }));
    link.merge = Some(true);
    Ok(link)
}

/// Cible du lien `self`, s'il existe.
pub fn self_href(links: &[Link]) -> Option<&str> {
    links.iter().find(|l| l.rel == "self").map(|l| l.href.as_str())
}
