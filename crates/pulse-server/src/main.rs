mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use pulse_api::token::TokenService;
use pulse_api::{AppState, AppStateInner};
use pulse_broadcaster::{Broadcaster, UniformRandom};
use pulse_gateway::connection;
use pulse_gateway::dispatcher::Dispatcher;

use crate::config::Config;

#[derive(Clone)]
struct ServerState {
    app: AppState,
    dispatcher: Dispatcher,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(pulse_db::Database::open(&PathBuf::from(&config.db_path))?);

    // Shared state
    let dispatcher = Dispatcher::new();
    let tokens = TokenService::new(config.jwt_secret.clone(), config.token_ttl);
    let app_state: AppState = Arc::new(AppStateInner { db: db.clone(), tokens });

    // Periodic synthetic-point broadcaster
    let broadcaster = Broadcaster::new(
        db,
        dispatcher.clone(),
        config.tick_period,
        Box::new(UniformRandom),
    );
    tokio::spawn(broadcaster.run());

    let state = ServerState {
        app: app_state.clone(),
        dispatcher,
    };

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(state);

    let app = pulse_api::router(app_state)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Pulse server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct GatewayQuery {
    token: String,
}

async fn ws_upgrade(
    State(state): State<ServerState>,
    Query(query): Query<GatewayQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    // Browsers cannot set headers on a WebSocket upgrade, so the token
    // rides in the query string
    let claims = state
        .app
        .tokens
        .verify(&query.token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher, claims.sub, claims.email)
    }))
}
