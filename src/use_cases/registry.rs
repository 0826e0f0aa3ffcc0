// Process-wide directory of active lobbies, mirroring the existing
// `LobbyRegistry`'s `RwLock<HashMap<...>>` pattern.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::domain::lobby_state::{AccessPolicy, EditableSettings};
use crate::domain::player::UserId;
use crate::use_cases::lobby::{Lobby, spawn_ticker};
use crate::use_cases::types::{LobbySummary, RegistryStats};

#[derive(Debug)]
pub enum LobbyError {
    AlreadyExists,
}

#[derive(Debug)]
pub struct LobbyRegistry {
    lobbies: RwLock<HashMap<Arc<str>, Arc<Lobby>>>,
}

impl Default for LobbyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self { lobbies: RwLock::new(HashMap::new()) }
    }

    /// Creates a lobby with a random UUID v4 id and spawns its ticker.
    pub async fn create(
        &self,
        creator_id: UserId,
        settings: EditableSettings,
        access: AccessPolicy,
        custom_words: Vec<String>,
    ) -> Arc<Lobby> {
        let id: Arc<str> = Arc::from(Uuid::new_v4().to_string());
        let lobby = Arc::new(Lobby::new(id.clone(), creator_id, settings, access, custom_words));
        self.lobbies.write().await.insert(id.clone(), lobby.clone());
        spawn_ticker(lobby.clone());
        info!(lobby_id = %id, "lobby created");
        lobby
    }

    /// Creates a lobby under a caller-supplied id, failing if it's taken.
    /// Used by integration tests and any admin route that wants a stable id.
    pub async fn create_with_id(
        &self,
        id: String,
        creator_id: UserId,
        settings: EditableSettings,
        access: AccessPolicy,
        custom_words: Vec<String>,
    ) -> Result<Arc<Lobby>, LobbyError> {
        let id: Arc<str> = Arc::from(id);
        let mut lobbies = self.lobbies.write().await;
        if lobbies.contains_key(&id) {
            return Err(LobbyError::AlreadyExists);
        }
        let lobby = Arc::new(Lobby::new(id.clone(), creator_id, settings, access, custom_words));
        lobbies.insert(id.clone(), lobby.clone());
        spawn_ticker(lobby.clone());
        info!(lobby_id = %id, "lobby created");
        Ok(lobby)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Lobby>> {
        self.lobbies.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) {
        if let Some(lobby) = self.lobbies.write().await.remove(id) {
            lobby.shutdown().await;
        }
    }

    pub async fn list_public(&self) -> Vec<LobbySummary> {
        let lobbies: Vec<Arc<Lobby>> = self.lobbies.read().await.values().cloned().collect();
        let mut out = Vec::new();
        for lobby in lobbies {
            if !lobby.is_public().await {
                continue;
            }
            let (player_count, max_players, round, rounds) = lobby.summary().await;
            out.push(LobbySummary { id: lobby.id.clone(), player_count, max_players, round, rounds });
        }
        out
    }

    pub async fn stats(&self) -> RegistryStats {
        let lobbies: Vec<Arc<Lobby>> = self.lobbies.read().await.values().cloned().collect();
        let total_lobbies = lobbies.len();
        let mut total_connections = 0usize;
        for lobby in &lobbies {
            total_connections += lobby.connected_count().await as usize;
        }
        RegistryStats { total_lobbies, total_connections }
    }

    /// Removes the lobby if it currently has zero connected members.
    /// Called after a disconnect so abandoned lobbies don't linger forever.
    pub async fn remove_if_empty(&self, id: &str) {
        let lobby = { self.lobbies.read().await.get(id).cloned() };
        let Some(lobby) = lobby else { return };
        if lobby.connected_count().await == 0 {
            self.lobbies.write().await.remove(id);
        }
    }
}
