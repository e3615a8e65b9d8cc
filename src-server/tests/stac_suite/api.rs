// FICHIER : src-server/tests/stac_suite/api.rs

use crate::{init_test_env, point_item, TestEnv};
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value as JsonValue};
use stac_server::api::{build_router, ApiState};
use tower::ServiceExt;

fn router(env: &TestEnv) -> Router {
    build_router(ApiState::new(env.session.clone(), &env.config))
}

async fn json_body(resp: Response<Body>) -> (StatusCode, JsonValue) {
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("collect body");
    if bytes.is_empty() {
        return (status, JsonValue::Null);
    }
    let json: JsonValue = serde_json::from_slice(&bytes).expect("valid JSON response");
    (status, json)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "localhost:8080");
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    json_body(resp).await
}

async fn create_landsat(app: &Router) {
    let (status, _) = send(
        app,
        Method::POST,
        "/collections",
        Some(json!({ "id": "landsat", "description": "Landsat 8" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_and_landing_page() {
    let env = init_test_env().await;
    let app = router(&env);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Catalog");
    let self_link = body["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["rel"] == "self")
        .unwrap();
    assert_eq!(self_link["href"], "http://localhost:8080/");

    let (status, body) = send(&app, Method::GET, "/conformance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["conformsTo"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_forwarded_headers_drive_links() {
    let env = init_test_env().await;
    let app = router(&env);
    create_landsat(&app).await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/collections/landsat")
                .header("host", "interne:8080")
                .header("x-forwarded-proto", "https")
                .header("x-forwarded-host", "stac.example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, body) = json_body(resp).await;
    assert_eq!(status, StatusCode::OK);
    let self_link = body["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["rel"] == "self")
        .unwrap();
    assert_eq!(self_link["href"], "https://stac.example.org/collections/landsat");
}

#[tokio::test]
async fn test_collection_lifecycle_statuses() {
    let env = init_test_env().await;
    let app = router(&env);
    create_landsat(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/collections",
        Some(json!({ "id": "landsat", "description": "doublon" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ConflictError");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/collections",
        Some(json!({ "id": "landsat", "description": "révisée" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "révisée");

    let (status, body) = send(&app, Method::GET, "/collections", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collections"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, "/collections/landsat", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, "/collections/landsat", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/collections/landsat", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NotFoundError");
}

#[tokio::test]
async fn test_item_routes() {
    let env = init_test_env().await;
    let app = router(&env);
    create_landsat(&app).await;

    // Collection reprise du chemin quand le corps n'en donne pas
    let mut item = serde_json::to_value(point_item("scene-1", "", 1.0, 1.0, 1)).unwrap();
    item.as_object_mut().unwrap().remove("collection");
    let (status, body) = send(&app, Method::POST, "/collections/landsat/items", Some(item)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["collection"], "landsat");
    assert!(body["properties"]["created"].is_string());

    let other = serde_json::to_value(point_item("scene-2", "sentinel-2", 1.0, 1.0, 2)).unwrap();
    let (status, body) = send(&app, Method::POST, "/collections/landsat/items", Some(other)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ValidationError");

    let (status, body) = send(&app, Method::GET, "/collections/landsat/items/scene-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "scene-1");

    let changed = serde_json::to_value(point_item("scene-1", "landsat", 1.0, 1.0, 7)).unwrap();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/collections/landsat/items/scene-1",
        Some(changed.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["properties"]["foo"], 7);
    assert!(body["properties"]["updated"].is_string());

    let (status, _) = send(
        &app,
        Method::PUT,
        "/collections/landsat/items/autre-id",
        Some(changed),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/collections/landsat/items?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");
    assert_eq!(body["numberReturned"], 1);

    let (status, _) = send(&app, Method::GET, "/collections/landsat/items?limit=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, "/collections/landsat/items/scene-1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/collections/landsat/items/scene-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_and_post_search_agree() {
    let env = init_test_env().await;
    let app = router(&env);
    create_landsat(&app).await;
    for i in 1..=5 {
        let item = serde_json::to_value(point_item(&format!("item-{}", i), "landsat", 1.0, 1.0, i)).unwrap();
        let (status, _) = send(&app, Method::POST, "/collections/landsat/items", Some(item)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let query = r#"{"foo":{"gte":2,"lte":4}}"#;
    let uri = format!(
        "/search?collections=landsat&limit=2&sortby=%2Bfoo&query={}",
        url::form_urlencoded::byte_serialize(query.as_bytes()).collect::<String>()
    );
    let (status, get_page) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(get_page["numberMatched"], 3);

    let (status, post_page) = send(
        &app,
        Method::POST,
        "/search",
        Some(json!({
            "collections": ["landsat"],
            "limit": 2,
            "sortby": [{ "field": "foo", "direction": "asc" }],
            "query": { "foo": { "gte": 2, "lte": 4 } }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(get_page["features"], post_page["features"]);

    // Page suivante en GET : le lien `next` porte tous les paramètres
    let next = get_page["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["rel"] == "next")
        .unwrap();
    let next_url = url::Url::parse(next["href"].as_str().unwrap()).unwrap();
    let next_uri = format!("{}?{}", next_url.path(), next_url.query().unwrap());
    let (status, second) = send(&app, Method::GET, &next_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let foos: Vec<i64> = second["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["properties"]["foo"].as_i64().unwrap())
        .collect();
    assert_eq!(foos, vec![4]);
}

#[tokio::test]
async fn test_malformed_requests_are_bad_request() {
    let env = init_test_env().await;
    let app = router(&env);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/search")
                .header("host", "localhost:8080")
                .header("content-type", "application/json")
                .body(Body::from("{pas du json"))
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, body) = json_body(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ValidationError");

    let (status, _) = send(&app, Method::GET, "/search?bbox=1,2,3", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/search?token=%25%25", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
