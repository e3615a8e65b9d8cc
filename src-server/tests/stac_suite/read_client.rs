// FICHIER : src-server/tests/stac_suite/read_client.rs

use crate::{init_test_env, seed_collection, seed_items, BASE_URL};
use stac_server::stac::links;
use stac_server::stac::BaseCoreClient;
use stac_server::utils::AppError;

fn next_token(page: &stac_server::stac::models::FeatureCollection) -> Option<String> {
    let next = page.links.iter().find(|l| l.rel == "next")?;
    let url = url::Url::parse(&next.href).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn test_landing_page_and_conformance() {
    let env = init_test_env().await;

    let landing = env.core.landing_page(BASE_URL).await.unwrap();
    assert_eq!(landing.r#type, "Catalog");
    assert_eq!(landing.id, env.config.catalog.id);
    let rels: Vec<&str> = landing.links.iter().map(|l| l.rel.as_str()).collect();
    for rel in ["self", "root", "data", "conformance", "search"] {
        assert!(rels.contains(&rel), "lien '{}' absent", rel);
    }
    assert_eq!(landing.conforms_to, env.core.conformance().conforms_to);
}

#[tokio::test]
async fn test_list_collections_sorted_with_links() {
    let env = init_test_env().await;
    seed_collection(&env, "sentinel-2").await;
    seed_collection(&env, "landsat").await;

    let listed = env.core.list_collections(BASE_URL).await.unwrap();
    let ids: Vec<&str> = listed.collections.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["landsat", "sentinel-2"]);
    assert_eq!(
        links::self_href(&listed.collections[0].links),
        Some("http://localhost:8080/collections/landsat")
    );
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;

    let err = env.core.get_collection("absente", BASE_URL).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = env
        .core
        .get_item("absent", "landsat", BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = env
        .core
        .list_items("absente", None, None, BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_list_items_pages_through_collection() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    seed_collection(&env, "autre").await;
    seed_items(&env, "landsat", 5).await;
    seed_items(&env, "autre", 2).await;

    let mut seen = Vec::new();
    let mut token = None;
    loop {
        let page = env
            .core
            .list_items("landsat", Some(2), token.clone(), BASE_URL)
            .await
            .unwrap();
        assert_eq!(page.number_matched, Some(5));
        assert!(page.features.len() <= 2);
        for feature in &page.features {
            assert_eq!(feature["collection"], "landsat");
            seen.push(feature["id"].as_str().unwrap().to_string());
        }
        token = next_token(&page);
        if token.is_none() {
            break;
        }
    }

    seen.sort();
    assert_eq!(seen, vec!["item-1", "item-2", "item-3", "item-4", "item-5"]);
}

#[tokio::test]
async fn test_same_token_yields_same_page() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    seed_items(&env, "landsat", 4).await;

    let first = env
        .core
        .list_items("landsat", Some(2), None, BASE_URL)
        .await
        .unwrap();
    let token = next_token(&first).expect("lien next attendu");

    let a = env
        .core
        .list_items("landsat", Some(2), Some(token.clone()), BASE_URL)
        .await
        .unwrap();
    let b = env
        .core
        .list_items("landsat", Some(2), Some(token), BASE_URL)
        .await
        .unwrap();
    assert_eq!(a.features, b.features);
    assert_eq!(a.features.len(), 2);
}

#[tokio::test]
async fn test_stored_links_are_regenerated() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    seed_items(&env, "landsat", 1).await;

    let item = env
        .core
        .get_item("item-1", "landsat", "https://stac.example.org/api/")
        .await
        .unwrap();
    assert_eq!(
        links::self_href(&item.links),
        Some("https://stac.example.org/api/collections/landsat/items/item-1")
    );
}
