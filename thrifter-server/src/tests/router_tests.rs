//! Router tests over a lazily-connected pool. Only paths that fail before
//! touching the database are exercised here; everything else needs a live
//! Postgres and belongs in end-to-end tests.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use sqlx::postgres::PgPoolOptions;
use tower::util::ServiceExt;

use thrifter_core::database::PostgresDatabase;

use crate::infra::app_state::AppState;
use crate::infra::config::Config;
use crate::routes;

fn test_app() -> Router {
    let config: Config = serde_json::from_value(serde_json::json!({
        "database": { "url": "postgres://localhost/thrifter_test" },
        "auth": { "jwt_secret": "test_secret_key_for_testing_only" },
    }))
    .unwrap();

    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();
    let state = AppState::new(config, PostgresDatabase::from_pool(pool)).unwrap();

    routes::create_api_router(state)
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_answers_ok_at_root_and_under_v1() {
    for uri in ["/health", "/api/v1/health"] {
        let response = test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let response = test_app()
        .oneshot(json_post(
            "/api/v1/auth/register",
            serde_json::json!({
                "email": "alice@example.com",
                "password": "short",
                "name": "Alice",
                "location": "Lahore",
                "phone_number": "+923001234567",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_empty_credentials() {
    let response = test_app()
        .oneshot(json_post(
            "/api/v1/auth/login",
            serde_json::json!({ "email": "", "password": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contact_rejects_blank_submission() {
    let response = test_app()
        .oneshot(json_post(
            "/api/v1/contact",
            serde_json::json!({
                "first_name": "",
                "last_name": "Doe",
                "email": "jane@example.com",
                "phone_number": "+15551234567",
                "message": "hi",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_garbage_tokens() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/users")
                .header(header::AUTHORIZATION, "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
