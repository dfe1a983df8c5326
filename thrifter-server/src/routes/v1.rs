//! The `/api/v1` surface: a public tier, an authenticated tier and an
//! admin tier, each with its own middleware stack.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::contact;
use crate::infra::app_state::AppState;
use crate::users::admin_handlers;
use crate::users::auth::{handlers as auth_handlers, middleware as auth_middleware};

pub fn router(state: AppState) -> Router {
    public_routes()
        .merge(protected_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(super::health))
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/refresh", post(auth_handlers::refresh))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/auth/verify-otp", post(auth_handlers::verify_otp))
        .route("/auth/resend-otp", post(auth_handlers::resend_otp))
        .route("/auth/forgot-password", post(auth_handlers::forgot_password))
        .route("/auth/reset-password", post(auth_handlers::reset_password))
        .route("/contact", post(contact::create_contact))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/auth/me",
            get(auth_handlers::get_current_user).put(auth_handlers::update_current_user),
        )
        .route(
            "/auth/change-password",
            post(auth_handlers::change_password),
        )
        .layer(middleware::from_fn_with_state(
            state,
            auth_middleware::authenticate,
        ))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(admin_handlers::list_users).post(admin_handlers::create_user),
        )
        .route("/users/stats", get(admin_handlers::user_stats))
        .route(
            "/users/{id}",
            get(admin_handlers::get_user)
                .delete(admin_handlers::delete_user)
                .put(admin_handlers::update_user),
        )
        .route("/contacts", get(contact::list_contacts))
        .layer(middleware::from_fn(auth_middleware::require_admin))
        .layer(middleware::from_fn_with_state(
            state,
            auth_middleware::authenticate,
        ))
}
