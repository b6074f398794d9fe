use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::registry::SessionRegistry;
use crate::rooms::ConnectionRouter;
use crate::{api, config, connection, janitor};

/// Shared process state: the session registry and the connection router.
#[derive(Default)]
pub struct ServerState {
    pub registry: SessionRegistry,
    pub router: ConnectionRouter,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub type SharedState = Arc<ServerState>;

pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let state: SharedState = Arc::new(ServerState::new());
    janitor::spawn(state.clone(), config::cleanup_interval());

    let cors = CorsLayer::new()
        .allow_origin(config::client_url().parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/api/games/create", post(api::create_game))
        .route("/api/games/:pin", get(api::get_game))
        .route("/ws", get(connection::ws_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
