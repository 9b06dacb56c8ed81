use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use voxgate_core::PoolManager;

#[derive(Clone)]
struct AppState {
    pool_manager: Arc<PoolManager>,
}

pub fn build_router(pool_manager: Arc<PoolManager>) -> Router {
    let state = AppState { pool_manager };
    Router::new()
        .route("/healthz", get(healthz))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn stats(State(state): State<AppState>) -> Json<Value> {
    let stats = state.pool_manager.stats();
    let by_kind: serde_json::Map<String, Value> = stats
        .into_iter()
        .map(|(kind, pool_stats)| {
            (
                kind.to_string(),
                json!({
                    "available": pool_stats.available,
                    "total": pool_stats.total,
                    "in_use": pool_stats.in_use(),
                    "min": pool_stats.min,
                    "max": pool_stats.max,
                }),
            )
        })
        .collect();
    Json(Value::Object(by_kind))
}
