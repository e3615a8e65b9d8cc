// FICHIER : src-server/tests/stac_suite/search.rs

use crate::{init_test_env, point_item, seed_collection, seed_items, TestEnv, BASE_URL};
use serde_json::{json, Value};
use stac_server::stac::client::NextLinkStyle;
use stac_server::stac::models::FeatureCollection;
use stac_server::stac::search::SearchRequest;
use stac_server::stac::{BaseCoreClient, BaseTransactionsClient};
use stac_server::utils::AppError;

async fn search(env: &TestEnv, body: Value) -> stac_server::utils::Result<FeatureCollection> {
    let request = SearchRequest::from_value(body)?;
    env.core.search(request, NextLinkStyle::Post, BASE_URL).await
}

fn ids(page: &FeatureCollection) -> Vec<String> {
    let mut ids: Vec<String> = page
        .features
        .iter()
        .map(|f| f["id"].as_str().unwrap_or_default().to_string())
        .collect();
    ids.sort();
    ids
}

async fn landsat_with(n: i64) -> TestEnv {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    seed_items(&env, "landsat", n).await;
    env
}

#[tokio::test]
async fn test_query_range_composes_predicates() {
    let env = landsat_with(5).await;

    let page = search(&env, json!({ "query": { "foo": { "gte": 2, "lte": 4 } } }))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["item-2", "item-3", "item-4"]);
}

#[tokio::test]
async fn test_query_accepts_encoded_string() {
    let env = landsat_with(5).await;

    let page = search(&env, json!({ "query": "{\"foo\": {\"eq\": 3}}" }))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["item-3"]);

    let err = search(&env, json!({ "query": "{pas du json" })).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_unknown_operator_is_rejected() {
    let env = landsat_with(1).await;
    let err = search(&env, json!({ "query": { "foo": { "environ": 2 } } }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_intersects_keeps_points_inside_polygon() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    env.tx
        .create_item(point_item("dedans", "landsat", 1.0, 1.0, 1), BASE_URL)
        .await
        .unwrap();
    env.tx
        .create_item(point_item("dehors", "landsat", 20.0, 20.0, 2), BASE_URL)
        .await
        .unwrap();

    let polygon = json!({
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [5.0, 0.0], [5.0, 5.0], [0.0, 5.0], [0.0, 0.0]]]
    });
    let page = search(&env, json!({ "intersects": polygon })).await.unwrap();
    assert_eq!(ids(&page), vec!["dedans"]);
}

#[tokio::test]
async fn test_bbox_filter() {
    let env = landsat_with(5).await;
    let page = search(&env, json!({ "bbox": [0.5, 0.5, 3.5, 3.5] })).await.unwrap();
    assert_eq!(ids(&page), vec!["item-1", "item-2", "item-3"]);

    let err = search(&env, json!({ "bbox": [0.0, 5.0, 1.0, 1.0] })).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_limit_caps_results() {
    let env = landsat_with(10).await;

    let page = search(&env, json!({ "limit": 3 })).await.unwrap();
    assert_eq!(page.features.len(), 3);
    assert_eq!(page.number_returned, Some(3));
    assert_eq!(page.number_matched, Some(10));
    let context = page.context.unwrap();
    assert_eq!((context.returned, context.limit, context.matched), (3, 3, 10));

    let err = search(&env, json!({ "limit": 0 })).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_post_pagination_follows_next_body() {
    let env = landsat_with(5).await;

    let mut request = json!({ "limit": 2, "sortby": [{ "field": "foo", "direction": "desc" }] });
    let mut order = Vec::new();
    loop {
        let page = search(&env, request.clone()).await.unwrap();
        order.extend(
            page.features
                .iter()
                .map(|f| f["properties"]["foo"].as_i64().unwrap()),
        );
        let Some(next) = page.links.iter().find(|l| l.rel == "next") else {
            break;
        };
        assert_eq!(next.method.as_deref(), Some("POST"));
        assert_eq!(next.merge, Some(true));
        request["token"] = next.body.as_ref().unwrap()["token"].clone();
    }
    assert_eq!(order, vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn test_sortby_over_mixed_labels_pages_through() {
    let env = init_test_env().await;
    seed_collection(&env, "landsat").await;
    let labels = [
        "2020-01-01T01:00:00+01:00",
        "2020-01-01T00:00:00Z",
        "2020-01-01T00:30",
        "zeta",
        "2019-12-31T23:59:59-05:00",
        "Alpha",
        "2020-01-01",
    ];
    for i in 0..60 {
        let mut item = point_item(&format!("item-{}", i), "landsat", 0.0, 0.0, 1);
        item.properties
            .insert("label".to_string(), json!(labels[i % labels.len()]));
        env.tx.create_item(item, BASE_URL).await.unwrap();
    }

    let mut request = json!({ "limit": 1, "sortby": [{ "field": "label", "direction": "asc" }] });
    let mut seen = Vec::new();
    loop {
        let page = search(&env, request.clone()).await.unwrap();
        seen.extend(ids(&page));
        let Some(next) = page.links.iter().find(|l| l.rel == "next") else {
            break;
        };
        request["token"] = next.body.as_ref().unwrap()["token"].clone();
    }

    assert_eq!(seen.len(), 60);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 60);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let env = landsat_with(1).await;
    let err = search(&env, json!({ "token": "%%%" })).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_datetime_instant_and_intervals() {
    let env = landsat_with(10).await;

    let page = search(&env, json!({ "datetime": "2024-01-07T00:00:00Z" })).await.unwrap();
    assert_eq!(ids(&page), vec!["item-7"]);

    let page = search(
        &env,
        json!({ "datetime": "2024-01-03T00:00:00Z/2024-01-05T00:00:00Z" }),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec!["item-3", "item-4", "item-5"]);

    let page = search(&env, json!({ "datetime": "../2024-01-02T00:00:00Z" }))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["item-1", "item-2"]);

    let err = search(&env, json!({ "datetime": "../.." })).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_collections_and_ids_filters() {
    let env = landsat_with(3).await;
    seed_collection(&env, "sentinel-2").await;
    seed_items(&env, "sentinel-2", 2).await;

    let page = search(&env, json!({ "collections": ["sentinel-2"] })).await.unwrap();
    assert_eq!(page.features.len(), 2);

    let page = search(
        &env,
        json!({ "collections": ["landsat", "sentinel-2"], "ids": ["item-1"] }),
    )
    .await
    .unwrap();
    assert_eq!(ids(&page), vec!["item-1", "item-1"]);
}

#[tokio::test]
async fn test_fields_projection() {
    let env = landsat_with(2).await;

    let page = search(
        &env,
        json!({ "fields": { "include": ["properties.foo"], "exclude": [] } }),
    )
    .await
    .unwrap();
    let feature = &page.features[0];
    assert!(feature.contains_key("id"));
    assert!(feature.contains_key("collection"));
    assert!(feature["properties"].get("foo").is_some());
    assert!(feature["properties"].get("datetime").is_none());
    assert!(!feature.contains_key("assets"));

    let page = search(&env, json!({ "fields": { "exclude": ["geometry"] } }))
        .await
        .unwrap();
    assert!(!page.features[0].contains_key("geometry"));
    assert!(page.features[0].contains_key("links"));
}

#[tokio::test]
async fn test_get_style_next_link_keeps_parameters() {
    let env = landsat_with(3).await;
    let request = SearchRequest {
        collections: Some(vec!["landsat".to_string()]),
        limit: Some(2),
        ..Default::default()
    };
    let params = vec![
        ("collections".to_string(), "landsat".to_string()),
        ("limit".to_string(), "2".to_string()),
    ];
    let page = env
        .core
        .search(request, NextLinkStyle::Get { params }, BASE_URL)
        .await
        .unwrap();

    let next = page.links.iter().find(|l| l.rel == "next").unwrap();
    let url = url::Url::parse(&next.href).unwrap();
    assert_eq!(url.path(), "/search");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("collections".to_string(), "landsat".to_string())));
    assert!(pairs.iter().any(|(k, _)| k == "token"));
}
