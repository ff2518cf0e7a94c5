//! HTTP/JSON API
//!
//! Routes:
//! - `GET  /health` - liveness probe
//! - `POST /api/orders/load` - idempotent order ingest (object or array body)
//! - `GET  /api/orders?status=<stage>` - orders-by-stage query
//! - `POST /api/items/update` - apply one stage transition
//!
//! The transition response always reports the authoritative persisted state;
//! notification delivery happens on a spawned task and is surfaced only as a
//! `notified` indication.

use crate::config::OrderdConfig;
use crate::engine::{TransitionEngine, TransitionError};
use crate::import::ingest;
use crate::models::{PayloadValidator, Stage};
use crate::notify::{self, Notifier};
use crate::store::OrderStore;
use crate::{Colorize, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<OrderStore>>,
    pub engine: Arc<TransitionEngine>,
    pub validator: Arc<PayloadValidator>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(store: OrderStore, config: OrderdConfig) -> Self {
        let notifier = notify::build_notifier(&config.notify);
        Self {
            store: Arc::new(RwLock::new(store)),
            engine: Arc::new(TransitionEngine::new(config)),
            validator: Arc::new(PayloadValidator::new()),
            notifier,
        }
    }
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/orders/load", post(handle_load_order))
        .route("/api/orders", get(handle_get_orders))
        .route("/api/items/update", post(handle_update_item))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: OrderdConfig) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let store = OrderStore::open(config.store_path())?;
    let state = AppState::new(store, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("{}", format!("✓ orderd listening on http://{}", addr).green());
    println!("{}", format!("  Ingest:  POST http://{}/api/orders/load", addr).cyan());
    println!("{}", format!("  Orders:  GET  http://{}/api/orders", addr).cyan());

    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Ingest endpoint: one order object or an array of them
async fn handle_load_order(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let mut store = state.store.write().await;

    match ingest::ingest_value(&mut store, &state.validator, &body) {
        Ok(report) => {
            let status = if report.created > 0 {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(report)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("{:#}", e) })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct OrdersQuery {
    status: Option<String>,
}

/// Orders-by-stage query endpoint
async fn handle_get_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let filter = match query.status.as_deref() {
        Some(raw) => match Stage::parse(raw) {
            Some(stage) => Some(stage),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("unknown stage '{}'", raw) })),
                )
                    .into_response();
            }
        },
        None => None,
    };

    let store = state.store.read().await;
    Json(store.query(filter)).into_response()
}

#[derive(Debug, Deserialize)]
struct UpdateItemRequest {
    item_id: u64,
    next_stage: String,
    #[serde(default)]
    notes: Option<String>,
}

/// Transition endpoint
async fn handle_update_item(
    State(state): State<AppState>,
    Json(request): Json<UpdateItemRequest>,
) -> Response {
    let outcome = {
        let mut store = state.store.write().await;
        state.engine.advance(
            &mut store,
            request.item_id,
            &request.next_stage,
            request.notes.as_deref(),
        )
    };

    match outcome {
        Ok(transition) => {
            let notified = transition.notification.is_some();

            // Delivery is off the critical path: the transition is already
            // persisted, a failed send is logged and not retried
            if let Some(note) = transition.notification {
                let notifier = state.notifier.clone();
                tokio::spawn(async move {
                    if let Err(e) = notifier.send(&note).await {
                        eprintln!("{}", format!("⚠ Notification failed: {}", e).yellow());
                    }
                });
            }

            Json(json!({
                "message": format!("Item moved to {}", transition.item.status),
                "item": transition.item,
                "history": transition.entry,
                "notified": notified,
            }))
            .into_response()
        }
        Err(e) => {
            let status = match &e {
                TransitionError::ItemNotFound(_) => StatusCode::NOT_FOUND,
                TransitionError::UnknownStage(_) | TransitionError::InvalidTransition { .. } => {
                    StatusCode::BAD_REQUEST
                }
                TransitionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}
