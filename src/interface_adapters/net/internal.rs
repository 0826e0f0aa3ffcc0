// Admin/bootstrap HTTP routes: thin wrappers over the lobby registry.

use crate::domain::lobby_state::{AccessPolicy, EditableSettings};
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::state::AppState;
use crate::use_cases::types::{LobbySummary, RegistryStats};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct CreateLobbyRequest {
    pub creator_id: String,
    #[serde(default)]
    pub settings: EditableSettings,
    #[serde(default)]
    pub access: AccessPolicy,
    #[serde(default)]
    pub custom_words: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
struct CreateLobbyResponse {
    lobby_id: String,
}

pub async fn create_lobby_handler(State(state): State<Arc<AppState>>, Json(payload): Json<CreateLobbyRequest>) -> impl IntoResponse {
    let creator_id = payload.creator_id.trim().to_string();
    if creator_id.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: "creator_id is required".to_string() })).into_response();
    }

    let lobby = state
        .lobby_registry
        .create(Arc::from(creator_id), payload.settings, payload.access, payload.custom_words)
        .await;

    (StatusCode::CREATED, Json(CreateLobbyResponse { lobby_id: lobby.id.to_string() })).into_response()
}

#[derive(Debug, serde::Serialize)]
struct LobbySummaryDto {
    id: String,
    player_count: usize,
    max_players: u32,
    round: u32,
    rounds: u32,
}

impl From<LobbySummary> for LobbySummaryDto {
    fn from(s: LobbySummary) -> Self {
        Self { id: s.id.to_string(), player_count: s.player_count, max_players: s.max_players, round: s.round, rounds: s.rounds }
    }
}

pub async fn list_lobbies_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let lobbies: Vec<LobbySummaryDto> = state.lobby_registry.list_public().await.into_iter().map(LobbySummaryDto::from).collect();
    Json(lobbies)
}

#[derive(Debug, serde::Serialize)]
struct RegistryStatsDto {
    total_lobbies: usize,
    total_connections: usize,
}

impl From<RegistryStats> for RegistryStatsDto {
    fn from(s: RegistryStats) -> Self {
        Self { total_lobbies: s.total_lobbies, total_connections: s.total_connections }
    }
}

pub async fn lobby_stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(RegistryStatsDto::from(state.lobby_registry.stats().await))
}
