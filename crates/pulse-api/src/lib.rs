pub mod auth;
pub mod charts;
pub mod error;
pub mod middleware;
pub mod token;

use std::sync::Arc;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
};

use pulse_db::Database;

use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub tokens: TokenService,
}

/// Assemble the REST surface: public auth routes plus the token-gated
/// chart routes. The WebSocket gateway is mounted separately by the
/// server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/charts", get(charts::list_charts).post(charts::create_chart))
        .route("/charts/{id}", put(charts::update_chart).delete(charts::delete_chart))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    public_routes.merge(protected_routes)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
