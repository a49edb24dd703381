//! Router behavior that resolves before any database access: validation, id parsing,
//! empty patches, CORS and body limits. The pool is lazy and never connects.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rental_inventory::{app, AppConfig, AppState};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

fn router_with(extra: &[(&str, &str)]) -> Router {
    let mut pairs: Vec<(String, String)> = vec![
        ("DATABASE_URL".into(), "postgres://nobody@127.0.0.1:1/none".into()),
        ("APP_ENV".into(), "test".into()),
        ("FRONTEND_PORT".into(), "5173".into()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    let config = AppConfig::from_lookup(|key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())).unwrap();
    let pool = PgPoolOptions::new()
        .connect_lazy_with(config.database.connect_options().unwrap());
    app(AppState::new(pool), &config)
}

fn router() -> Router {
    router_with(&[])
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_and_version() {
    let (status, body) = send(router(), Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(router(), Request::get("/version").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "rental-inventory");
}

#[tokio::test]
async fn create_rentable_reports_every_violation() {
    let req = json_request(
        Method::POST,
        "/api/inventory/rentable",
        json!({
            "name": "",
            "has_parts": true,
            "parts": [],
            "availability": {"total": 1, "maintenance": 1, "broken": 1}
        }),
    );
    let (status, body) = send(router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    let details = body["error"]["details"].as_array().unwrap();
    let paths: Vec<&str> = details.iter().filter_map(|d| d["path"].as_str()).collect();
    assert!(paths.contains(&"name"));
    assert!(paths.contains(&"parts"));
    assert!(paths.contains(&"availability"));
    let parts = details.iter().find(|d| d["path"] == "parts").unwrap();
    assert_eq!(parts["entity"], "Rentable");
    assert_eq!(parts["message"], "If has_parts, parts may not be empty array.");
}

#[tokio::test]
async fn empty_part_patch_is_rejected() {
    let uri = format!("/api/inventory/part/{}", uuid::Uuid::new_v4());
    let (status, body) = send(router(), json_request(Method::PATCH, &uri, json!({"name": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["message"], "update contains no changes, rejected.");
}

#[tokio::test]
async fn availability_patch_with_only_nulls_has_no_fields() {
    let uri = format!("/api/inventory/availability/{}", uuid::Uuid::new_v4());
    let (status, body) = send(router(), json_request(Method::PATCH, &uri, json!({"total": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "no_valid_fields");
}

#[tokio::test]
async fn negative_counter_is_a_validation_error() {
    let uri = format!("/api/inventory/availability/{}", uuid::Uuid::new_v4());
    let (status, body) = send(router(), json_request(Method::PATCH, &uri, json!({"broken": -1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["path"], "broken");
}

#[tokio::test]
async fn user_patch_with_nothing_to_change() {
    let uri = format!("/api/user/{}", uuid::Uuid::new_v4());
    let (status, body) = send(router(), json_request(Method::PATCH, &uri, json!({"name": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "no_valid_fields");
}

#[tokio::test]
async fn standalone_part_needs_rentable_id() {
    let req = json_request(Method::POST, "/api/inventory/part", json!({"name": "Pole", "quantity": 4}));
    let (status, body) = send(router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["path"], "rentable_id");
}

#[tokio::test]
async fn malformed_ids_and_bodies_are_bad_requests() {
    let req = Request::get("/api/inventory/rentable/not-a-uuid").body(Body::empty()).unwrap();
    let (status, body) = send(router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/user")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let (status, body) = send(router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let router = router_with(&[("BODY_LIMIT_BYTES", "64")]);
    let payload = json!({"name": "x".repeat(200), "has_parts": false}).to_string();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/inventory/rentable")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn variant_patch_with_only_nulls_is_rejected() {
    let uri = format!("/api/inventory/variant/{}", uuid::Uuid::new_v4());
    let (status, body) = send(router(), json_request(Method::PATCH, &uri, json!({"name": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"][0]["message"], "update contains no changes, rejected.");
}

#[tokio::test]
async fn item_bodies_are_validated() {
    let req = json_request(Method::POST, "/api/inventory/item", json!({"name": "  ", "description": null}));
    let (status, body) = send(router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["entity"], "Item");
    assert_eq!(body["error"]["details"][0]["path"], "name");

    let uri = format!("/api/inventory/item/{}", uuid::Uuid::new_v4());
    let (status, body) = send(router(), json_request(Method::PATCH, &uri, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["message"], "update contains no changes, rejected.");
}

#[tokio::test]
async fn missing_content_type_is_unsupported() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/inventory/item")
        .body(Body::from(json!({"name": "Lamp"}).to_string()))
        .unwrap();
    let (status, body) = send(router(), req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["code"], "unsupported_media_type");
}

#[tokio::test]
async fn over_limit_body_without_length_is_refused() {
    let router = router_with(&[("BODY_LIMIT_BYTES", "64")]);
    // No Content-Length: the limit trips while the extractor buffers the body.
    let req = json_request(
        Method::POST,
        "/api/inventory/rentable",
        json!({"name": "x".repeat(200), "has_parts": false}),
    );
    let (status, body) = send(router, req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "payload_too_large");
}

#[tokio::test]
async fn cors_allows_local_frontend() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/inventory/rentable")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .body(Body::empty())
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );

    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/inventory/rentable")
        .header(header::ORIGIN, "http://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .body(Body::empty())
        .unwrap();
    let resp = router().oneshot(req).await.unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
