use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use pokec_api::middleware::require_auth;
use pokec_api::{AppState, AppStateInner, auth, messages, moderation, profile, support};
use pokec_engine::{Engine, Policy};
use pokec_gateway::connection;
use pokec_gateway::dispatcher::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pokec=debug,tower_http=debug".into()),
        )
        .init();

    // Config. The store location is required: a chat server silently writing
    // to the wrong database is worse than one that refuses to start.
    let db_path = std::env::var("POKEC_DB_PATH")
        .context("POKEC_DB_PATH is required (path to the SQLite database)")?;
    let jwt_secret =
        std::env::var("POKEC_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let host = std::env::var("POKEC_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("POKEC_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .context("POKEC_PORT must be a port number")?;

    let policy = policy_from_env()?;

    // Init database
    let db = Arc::new(pokec_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let dispatcher = Dispatcher::new();
    let engine = Arc::new(Engine::new(db, policy));
    let app_state: AppState = Arc::new(AppStateInner {
        engine,
        dispatcher: dispatcher.clone(),
        jwt_secret: jwt_secret.clone(),
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route(
            "/rooms/{room}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route("/users/me", patch(profile::update_profile))
        .route("/support/upgrade", post(support::request_upgrade))
        .route("/admin/users", get(moderation::list_users))
        .route("/admin/users/{email}/ban", post(moderation::ban_user))
        .route("/admin/users/{email}/mute", post(moderation::mute_user))
        .route("/admin/users/{email}/unmute", post(moderation::unmute_user))
        .route("/admin/users/{email}/vip", post(moderation::grant_vip))
        .route("/admin/messages/{id}", delete(moderation::delete_message))
        .route("/admin/rooms/clear", post(moderation::clear_room))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state.clone());

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Pokec server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn policy_from_env() -> anyhow::Result<Policy> {
    let mut policy = Policy::default();

    if let Ok(raw) = std::env::var("POKEC_PAGE_SIZE") {
        policy.page_size = raw.parse().context("POKEC_PAGE_SIZE must be a number")?;
    }
    if let Ok(raw) = std::env::var("POKEC_BAN_MODE") {
        policy.ban_mode = raw.parse()?;
    }
    if let Ok(raw) = std::env::var("POKEC_CLEAR_SCOPE") {
        policy.clear_scope = raw.parse()?;
    }
    if let Ok(raw) = std::env::var("POKEC_ALLOW_EMPTY") {
        policy.allow_empty = raw
            .parse()
            .context("POKEC_ALLOW_EMPTY must be true or false")?;
    }

    Ok(policy)
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    let jwt_secret = state.jwt_secret.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher, jwt_secret))
}
