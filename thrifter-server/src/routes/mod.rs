//! HTTP routing. Everything versioned lives under `/api/v1`; the health
//! probe is also aliased at the root for load balancers.

pub mod v1;

use axum::{Json, Router, routing::get};

use thrifter_core::ApiResponse;

use crate::infra::app_state::AppState;

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1::router(state))
}

pub(crate) async fn health() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(serde_json::json!({ "status": "ok" })))
}
