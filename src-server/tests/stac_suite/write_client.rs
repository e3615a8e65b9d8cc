// FICHIER : src-server/tests/stac_suite/write_client.rs

use crate::{init_test_env, point_item, seed_collection, BASE_URL};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use stac_server::stac::client::NextLinkStyle;
use stac_server::stac::models::Collection;
use stac_server::stac::search::SearchRequest;
use stac_server::stac::{links, BaseCoreClient, BaseTransactionsClient};
use stac_server::utils::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn parse_time(value: &serde_json::Value) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().expect("horodatage texte"))
        .expect("horodatage RFC 3339")
        .with_timezone(&Utc)
}

#[tokio::test]
async fn test_item_round_trip() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;

    let mut item = point_item("scene-1", "landsat", 2.35, 48.85, 1);
    item.assets
        .insert("thumbnail".to_string(), json!({ "href": "thumb.png" }));
    item.additional_fields
        .insert("stac_extensions".to_string(), json!([]));
    let created = env.tx.create_item(item, BASE_URL).await.unwrap();

    let mut fetched = env
        .core
        .get_item("scene-1", "landsat", BASE_URL)
        .await
        .unwrap();
    assert_eq!(
        links::self_href(&fetched.links),
        Some("http://localhost:8080/collections/landsat/items/scene-1")
    );
    let parent = fetched.links.iter().find(|l| l.rel == "parent").unwrap();
    assert_eq!(parent.href, "http://localhost:8080/collections/landsat");

    let mut expected = created.clone();
    expected.links.clear();
    fetched.links.clear();
    assert_eq!(fetched, expected);
    assert_eq!(fetched.bbox, Some(vec![2.35, 48.85, 2.35, 48.85]));
}

#[tokio::test]
async fn test_create_item_requires_parent_collection() {
    let env = init_test_env().await;
    let err = env
        .tx
        .create_item(point_item("orphelin", "absente", 0.0, 0.0, 1), BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_duplicate_item_is_conflict() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    env.tx
        .create_item(point_item("scene-1", "landsat", 0.0, 0.0, 1), BASE_URL)
        .await
        .unwrap();

    let err = env
        .tx
        .create_item(point_item("scene-1", "landsat", 9.0, 9.0, 9), BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let stored = env
        .core
        .get_item("scene-1", "landsat", BASE_URL)
        .await
        .unwrap();
    assert_eq!(stored.property("foo"), Some(&json!(1)));
}

#[tokio::test]
async fn test_duplicate_collection_keeps_first() {
    let env = init_test_env().await;
    let first = seed_collection(&env, "landsat").await;

    let second = Collection::new("landsat", "une autre description");
    let err = env
        .tx
        .create_collection(second, BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let stored = env.core.get_collection("landsat", BASE_URL).await.unwrap();
    assert_eq!(stored, first);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;

    env.tx.delete_item("fantome", "landsat").await.unwrap();
    env.tx.delete_item("fantome", "landsat").await.unwrap();

    env.tx
        .create_item(point_item("scene-1", "landsat", 0.0, 0.0, 1), BASE_URL)
        .await
        .unwrap();
    env.tx.delete_item("scene-1", "landsat").await.unwrap();
    env.tx.delete_item("scene-1", "landsat").await.unwrap();
    let err = env
        .core
        .get_item("scene-1", "landsat", BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    env.tx.delete_collection("jamais-creee").await.unwrap();
}

#[tokio::test]
async fn test_delete_collection_removes_its_items() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    seed_collection(&env, "autre").await;
    crate::seed_items(&env, "landsat", 3).await;
    crate::seed_items(&env, "autre", 1).await;

    env.tx.delete_collection("landsat").await.unwrap();

    let err = env.core.get_collection("landsat", BASE_URL).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = env
        .core
        .get_item("item-1", "landsat", BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(env.core.get_item("item-1", "autre", BASE_URL).await.is_ok());

    env.tx.delete_collection("landsat").await.unwrap();
}

#[tokio::test]
async fn test_timestamps_are_stamped() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    let tolerance = Duration::seconds(5);

    let before = Utc::now();
    let created = env
        .tx
        .create_item(point_item("scene-1", "landsat", 0.0, 0.0, 1), BASE_URL)
        .await
        .unwrap();
    let created_at = parse_time(created.property("created").unwrap());
    assert!(created_at >= before - tolerance && created_at <= Utc::now() + tolerance);
    assert!(created.property("updated").is_none());

    let mut changed = created.clone();
    changed.properties.insert("foo".to_string(), json!(42));
    changed.properties.remove("created");
    let before = Utc::now();
    let updated = env.tx.update_item(changed, BASE_URL).await.unwrap();

    assert_eq!(updated.property("created"), created.property("created"));
    let updated_at = parse_time(updated.property("updated").unwrap());
    assert!(updated_at >= before - tolerance && updated_at <= Utc::now() + tolerance);

    let stored = env
        .core
        .get_item("scene-1", "landsat", BASE_URL)
        .await
        .unwrap();
    assert_eq!(stored.property("foo"), Some(&json!(42)));
    assert_eq!(stored.property("created"), created.property("created"));
}

#[tokio::test]
async fn test_client_supplied_created_is_kept() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;

    let mut item = point_item("scene-1", "landsat", 0.0, 0.0, 1);
    item.properties
        .insert("created".to_string(), json!("2020-01-01T00:00:00Z"));
    let created = env.tx.create_item(item, BASE_URL).await.unwrap();
    assert_eq!(created.property("created"), Some(&json!("2020-01-01T00:00:00Z")));
}

#[tokio::test]
async fn test_update_missing_records_is_not_found() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;

    let err = env
        .tx
        .update_item(point_item("absent", "landsat", 0.0, 0.0, 1), BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = env
        .tx
        .update_collection(Collection::new("absente", "x"), BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_update_collection_replaces_document() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;

    let mut changed = Collection::new("landsat", "description révisée");
    changed.title = Some("Landsat".to_string());
    env.tx.update_collection(changed, BASE_URL).await.unwrap();

    let stored = env.core.get_collection("landsat", BASE_URL).await.unwrap();
    assert_eq!(stored.description, "description révisée");
    assert_eq!(stored.title.as_deref(), Some("Landsat"));
    assert!(!stored.additional_fields.contains_key("license"));
}

#[tokio::test]
async fn test_update_collection_keeps_stored_created() {
    let env = init_test_env().await;
    let mut collection = Collection::new("landsat", "archive");
    collection
        .additional_fields
        .insert("created".to_string(), json!("2020-01-01T00:00:00Z"));
    env.tx.create_collection(collection, BASE_URL).await.unwrap();

    // Corps sans `created`
    let updated = env
        .tx
        .update_collection(Collection::new("landsat", "v2"), BASE_URL)
        .await
        .unwrap();
    assert_eq!(
        updated.additional_fields.get("created"),
        Some(&json!("2020-01-01T00:00:00Z"))
    );

    // Corps avec un autre `created`
    let mut changed = Collection::new("landsat", "v3");
    changed
        .additional_fields
        .insert("created".to_string(), json!("2030-06-01T00:00:00Z"));
    env.tx.update_collection(changed, BASE_URL).await.unwrap();

    let stored = env.core.get_collection("landsat", BASE_URL).await.unwrap();
    assert_eq!(stored.description, "v3");
    assert_eq!(
        stored.additional_fields.get("created"),
        Some(&json!("2020-01-01T00:00:00Z"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_create_item_racing_delete_collection_leaves_no_orphan() {
    let env = init_test_env().await;

    for round in 0..100 {
        let collection_id = format!("c{}", round);
        seed_collection(&env, &collection_id).await;

        let create = {
            let tx = env.tx.clone();
            let item = point_item("x", &collection_id, 0.0, 0.0, 1);
            tokio::spawn(async move { tx.create_item(item, BASE_URL).await })
        };
        let delete = {
            let tx = env.tx.clone();
            let collection_id = collection_id.clone();
            tokio::spawn(async move { tx.delete_collection(&collection_id).await })
        };

        match create.await.unwrap() {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => {}
            Err(e) => panic!("création inattendue en échec : {}", e),
        }
        delete.await.unwrap().unwrap();

        let collection = env.core.get_collection(&collection_id, BASE_URL).await;
        assert!(matches!(collection, Err(AppError::NotFound(_))));

        let request = SearchRequest::from_value(json!({ "collections": [collection_id] })).unwrap();
        let page = env
            .core
            .search(request, NextLinkStyle::Post, BASE_URL)
            .await
            .unwrap();
        assert!(
            page.features.is_empty(),
            "item orphelin dans '{}' au tour {}",
            collection_id,
            round
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reader_never_sees_gap() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    env.tx
        .create_item(point_item("scene-1", "landsat", 0.0, 0.0, 1), BASE_URL)
        .await
        .unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let core = env.core.clone();
        let done = done.clone();
        tokio::spawn(async move {
            let mut reads = 0usize;
            while !done.load(Ordering::SeqCst) {
                let item = core
                    .get_item("scene-1", "landsat", BASE_URL)
                    .await
                    .expect("l'item ne doit jamais disparaître pendant une mise à jour");
                assert!(item.property("foo").is_some());
                reads += 1;
                tokio::task::yield_now().await;
            }
            reads
        })
    };

    for i in 2..=30 {
        let item = point_item("scene-1", "landsat", 0.0, 0.0, i);
        env.tx.update_item(item, BASE_URL).await.unwrap();
    }
    done.store(true, Ordering::SeqCst);

    let reads = reader.await.unwrap();
    assert!(reads > 0);
    let last = env
        .core
        .get_item("scene-1", "landsat", BASE_URL)
        .await
        .unwrap();
    assert_eq!(last.property("foo"), Some(&json!(30)));
}
