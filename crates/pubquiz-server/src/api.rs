//! Minimal REST surface: liveness and out-of-band session introspection.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pubquiz_common::game::GamePhase;

use crate::server::SharedState;

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
    games: usize,
}

pub async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        games: state.registry.len().await,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    host_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    game_id: Uuid,
    pin: String,
    host_id: Uuid,
}

pub async fn create_game(
    State(state): State<SharedState>,
    Json(req): Json<CreateGameRequest>,
) -> impl IntoResponse {
    match state.registry.create(req.host_name).await {
        Ok(session) => {
            let s = session.lock().await;
            Json(CreateGameResponse {
                game_id: s.id,
                pin: s.pin.clone(),
                host_id: s.host_id,
            })
            .into_response()
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

#[derive(Serialize)]
pub struct GameSummary {
    pin: String,
    state: GamePhase,
    teams: usize,
    questions: usize,
}

pub async fn get_game(
    Path(pin): Path<String>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    match state.registry.lookup(&pin).await {
        Some(session) => {
            let s = session.lock().await;
            Json(GameSummary {
                pin: s.pin.clone(),
                state: s.phase,
                teams: s.teams().len(),
                questions: s.question_count(),
            })
            .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Game not found").into_response(),
    }
}
