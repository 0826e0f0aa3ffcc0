// Outbound events the lobby engine can fan out to a socket. Kept at the
// domain layer so `use_cases` never needs to know about wire encoding; the
// interface adapter converts these into `ServerMessage` for serialization.

use crate::domain::drawing::DrawEvent;
use crate::domain::hint::WordHint;
use crate::domain::lobby_state::{EditableSettings, LobbyStateKind};
use crate::domain::player::UserId;

#[derive(Debug, Clone)]
pub struct PlayerView {
    pub id: UserId,
    pub display_name: String,
    pub score: i64,
    pub last_score: i64,
    pub rank: u32,
    pub role: crate::domain::player::PlayerRole,
    pub connected: bool,
}

#[derive(Debug, Clone)]
pub struct ReadyView {
    pub state: LobbyStateKind,
    pub owner_id: UserId,
    pub round: u32,
    pub rounds: u32,
    pub round_end_relative_ms: i64,
    pub drawing_time_setting: u32,
    pub word_hints: Vec<WordHint>,
    pub players: Vec<PlayerView>,
    pub current_drawing: Vec<DrawEvent>,
    /// Set only for the connecting player; `None` for observers.
    pub player_id: Option<UserId>,
    pub allow_drawing: bool,
}

#[derive(Debug, Clone)]
pub struct TurnOverResult {
    pub player_id: UserId,
    pub last_score: i64,
}

#[derive(Debug, Clone)]
pub enum Outbound {
    Ready(Box<ReadyView>),
    UpdatePlayers(Vec<PlayerView>),
    UpdateWordHint(Vec<WordHint>),
    Message {
        author: String,
        author_id: UserId,
        content: String,
    },
    NonGuessingPlayerMessage {
        author: String,
        author_id: UserId,
        content: String,
    },
    CorrectGuess(UserId),
    CloseGuess(String),
    Draw(DrawEvent),
    Drawing(Vec<DrawEvent>),
    YourTurn(Vec<String>),
    NextTurn {
        round: u32,
        players: Vec<PlayerView>,
        round_end_relative_ms: i64,
    },
    TurnOver {
        word: String,
        results: Vec<TurnOverResult>,
    },
    GameOver(Box<ReadyView>),
    Kick {
        player_id: UserId,
        player_name: String,
    },
    DrawerKicked,
    OwnerChange {
        player_id: UserId,
        player_name: String,
    },
    LobbySettingsChanged(EditableSettings),
    Shutdown,
    SystemMessage(String),
}
