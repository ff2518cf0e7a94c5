//! Integration tests for the HTTP API
//!
//! Exercises the router directly with in-memory requests:
//! - idempotent ingest at `POST /api/orders/load`
//! - the orders-by-stage query at `GET /api/orders`
//! - stage transitions at `POST /api/items/update`

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use orderd::config::OrderdConfig;
use orderd::server::{build_router, AppState};
use orderd::store::OrderStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn sample_order(order_id: &str) -> Value {
    json!({
        "order_id": order_id,
        "timestamp": "2025-06-12T11:45:22+00:00",
        "customer": {
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "555-0100",
            "address": "1 Engine St"
        },
        "total": 20.0,
        "items": [
            { "name": "Widget", "quantity": 2, "price": 5.0 },
            { "name": "Gadget", "quantity": 1, "price": 10.0 }
        ]
    })
}

fn setup(temp: &TempDir) -> (Router, AppState) {
    let mut config = OrderdConfig::default();
    config.data_dir = temp.path().join("data");
    config.import_dir = temp.path().join("imports");
    config.sidecar_dir = temp.path().join("orders");

    let store = OrderStore::open(config.store_path()).unwrap();
    let state = AppState::new(store, config);
    (build_router(state.clone()), state)
}

async fn request_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let request = match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let temp = TempDir::new().unwrap();
    let (app, _state) = setup(&temp);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_load_order_created_then_skipped() {
    let temp = TempDir::new().unwrap();
    let (app, state) = setup(&temp);

    let (status, body) =
        request_json(&app, "POST", "/api/orders/load", Some(sample_order("ORD-1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 1);

    let (status, body) =
        request_json(&app, "POST", "/api/orders/load", Some(sample_order("ORD-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 0);
    assert_eq!(body["skipped_existing"], 1);

    assert_eq!(state.store.read().await.order_count(), 1);
}

#[tokio::test]
async fn test_load_batch_continues_past_malformed_record() {
    let temp = TempDir::new().unwrap();
    let (app, _state) = setup(&temp);

    let batch = json!([
        sample_order("ORD-1"),
        { "timestamp": "2025-06-12T11:45:22+00:00" },
        sample_order("ORD-2")
    ]);

    let (status, body) = request_json(&app, "POST", "/api/orders/load", Some(batch)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 2);
    assert_eq!(body["skipped_malformed"], 1);
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_query_orders_by_stage() {
    let temp = TempDir::new().unwrap();
    let (app, _state) = setup(&temp);
    request_json(&app, "POST", "/api/orders/load", Some(sample_order("ORD-1"))).await;

    let (status, body) = request_json(&app, "GET", "/api/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    let views = body.as_array().unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["order_id"], "ORD-1");
    assert_eq!(views[0]["customer"]["name"], "Ada");
    assert_eq!(views[0]["items"].as_array().unwrap().len(), 2);

    let (status, body) = request_json(&app, "GET", "/api/orders?status=Material", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = request_json(&app, "GET", "/api/orders?status=Manufacturing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_query_rejects_unknown_stage() {
    let temp = TempDir::new().unwrap();
    let (app, _state) = setup(&temp);

    let (status, body) = request_json(&app, "GET", "/api/orders?status=Shipping", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Shipping"));
}

#[tokio::test]
async fn test_update_item_applies_transition() {
    let temp = TempDir::new().unwrap();
    let (app, state) = setup(&temp);
    request_json(&app, "POST", "/api/orders/load", Some(sample_order("ORD-1"))).await;

    let item_id = {
        let store = state.store.read().await;
        let order = store.order_by_external_id("ORD-1").unwrap();
        store.items_for_order(order.id)[0].id
    };

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/items/update",
        Some(json!({ "item_id": item_id, "next_stage": "Manufacturing", "notes": "started" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["status"], "Manufacturing");
    assert_eq!(body["history"]["notes"], "started");
    assert_eq!(body["notified"], true);

    let store = state.store.read().await;
    assert_eq!(store.item(item_id).unwrap().status.name(), "Manufacturing");
    assert_eq!(store.history_count(), 2);
}

#[tokio::test]
async fn test_update_item_rejects_stage_skip() {
    let temp = TempDir::new().unwrap();
    let (app, state) = setup(&temp);
    request_json(&app, "POST", "/api/orders/load", Some(sample_order("ORD-1"))).await;

    let item_id = {
        let store = state.store.read().await;
        let order = store.order_by_external_id("ORD-1").unwrap();
        store.items_for_order(order.id)[0].id
    };

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/items/update",
        Some(json!({ "item_id": item_id, "next_stage": "Dispatch" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid transition"));

    // State untouched after the rejection
    let store = state.store.read().await;
    assert_eq!(store.item(item_id).unwrap().status.name(), "Material");
    assert_eq!(store.history_count(), 1);
}

#[tokio::test]
async fn test_update_item_unknown_item_and_stage() {
    let temp = TempDir::new().unwrap();
    let (app, _state) = setup(&temp);

    let (status, _) = request_json(
        &app,
        "POST",
        "/api/items/update",
        Some(json!({ "item_id": 999, "next_stage": "Manufacturing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request_json(
        &app,
        "POST",
        "/api/items/update",
        Some(json!({ "item_id": 999, "next_stage": "Shipping" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
