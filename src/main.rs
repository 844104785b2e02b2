use axum::{
  extract::{State, WebSocketUpgrade},
  http::Method,
  response::IntoResponse,
  routing::get,
  Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod game;
mod protocol;
mod shared;
mod transport;

use config::ServerConfig;
use game::level::{default_level, load_level};
use game::room::Room;
use transport::ws_session::handle_socket;

#[derive(Clone)]
struct AppState {
  room: Arc<Room>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
  ok: bool,
  connections: usize,
  players: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = ServerConfig::from_env();
  let map = match &config.level_path {
    Some(path) => load_level(path)?,
    None => default_level(),
  };
  tracing::info!(
    width = map.width(),
    height = map.height(),
    room_max = config.room_max,
    "level loaded"
  );

  let room = Arc::new(Room::new(map, config.room_max));
  room.start();

  let state = Arc::new(AppState { room });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET])
    .allow_headers(Any);

  let app: Router = Router::new()
    .route("/api/health", get(health))
    .route("/api/ws", get(ws_handler))
    .layer(cors)
    .with_state(state);

  let address = config.address();
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address).await?;
  axum::serve(listener, app).await?;

  Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let stats = state.room.stats().await;
  Json(HealthResponse {
    ok: true,
    connections: stats.connections,
    players: stats.players,
  })
}

async fn ws_handler(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
  let room = Arc::clone(&state.room);
  ws.on_upgrade(move |socket| handle_socket(socket, room))
}
