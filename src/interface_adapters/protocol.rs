// Wire protocol DTOs and conversions between the domain's `Outbound` events
// and the tagged JSON frames clients speak.

use serde::{Deserialize, Serialize};

use crate::domain::drawing::{DrawEvent, Fill, Line, RgbColor};
use crate::domain::events::{Outbound, PlayerView, ReadyView, TurnOverResult};
use crate::domain::hint::WordHint;
use crate::domain::lobby_state::{EditableSettings, LobbyStateKind, SettingsEdit};
use crate::domain::player::PlayerRole;
use crate::domain::words::{self, Language};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join(JoinPayload),
    KeepAlive,
    Message(TextPayload),
    Line(LineDto),
    Fill(FillDto),
    ClearDrawingBoard,
    Undo,
    ChooseWord(ChooseWordPayload),
    Kick(KickPayload),
    Start,
    RequestDrawing,
    EditSettings(EditSettingsPayload),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    /// `None` joins as an anonymous observer; otherwise the session token is
    /// verified against the auth service to resolve a player identity.
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextPayload {
    pub content: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDto {
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    pub color: RgbColor,
    pub line_width: f32,
}

impl From<LineDto> for Line {
    fn from(d: LineDto) -> Self {
        Line { from_x: d.from_x, from_y: d.from_y, to_x: d.to_x, to_y: d.to_y, color: d.color, line_width: d.line_width }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FillDto {
    pub x: f32,
    pub y: f32,
    pub color: RgbColor,
}

impl From<FillDto> for Fill {
    fn from(d: FillDto) -> Self {
        Fill { x: d.x, y: d.y, color: d.color }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChooseWordPayload {
    pub index: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KickPayload {
    pub player_id: String,
}

/// A settings-edit request (§6.2). Every field is optional; omitted fields
/// are left unchanged. `language` is a locale code, parsed the same
/// fallback-to-English way as lobby creation; `custom_words` is raw
/// newline/comma-separated text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSettingsPayload {
    #[serde(default)]
    pub max_players: Option<u32>,
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub drawing_time: Option<u32>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub custom_words_chance: Option<u8>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub custom_words: Option<String>,
    #[serde(default)]
    pub followers_only: Option<bool>,
    #[serde(default)]
    pub subscribers_only: Option<bool>,
}

impl From<EditSettingsPayload> for SettingsEdit {
    fn from(p: EditSettingsPayload) -> Self {
        Self {
            max_players: p.max_players,
            rounds: p.rounds,
            drawing_time: p.drawing_time,
            public: p.public,
            custom_words_chance: p.custom_words_chance,
            language: p.language.as_deref().map(Language::from_code),
            custom_words: p.custom_words.as_deref().map(words::parse_custom_words),
            followers_only: p.followers_only,
            subscribers_only: p.subscribers_only,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    Ready(ReadyDto),
    UpdatePlayers(Vec<PlayerDto>),
    UpdateWordhint(Vec<WordHint>),
    Message(MessageDto),
    NonGuessingPlayerMessage(MessageDto),
    CorrectGuess(String),
    CloseGuess(String),
    Line(LineDto),
    Fill(FillDto),
    Drawing(Vec<DrawEventDto>),
    YourTurn(Vec<String>),
    NextTurn(NextTurnDto),
    TurnOver(TurnOverDto),
    GameOver(ReadyDto),
    Kick(KickDto),
    DrawerKicked,
    OwnerChange(OwnerChangeDto),
    LobbySettingsChanged(EditableSettingsDto),
    Shutdown,
    SystemMessage(String),
}

impl Serialize for LineDto {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Repr {
            from_x: f32,
            from_y: f32,
            to_x: f32,
            to_y: f32,
            color: RgbColor,
            line_width: f32,
        }
        Repr { from_x: self.from_x, from_y: self.from_y, to_x: self.to_x, to_y: self.to_y, color: self.color, line_width: self.line_width }
            .serialize(serializer)
    }
}

impl Serialize for FillDto {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr {
            x: f32,
            y: f32,
            color: RgbColor,
        }
        Repr { x: self.x, y: self.y, color: self.color }.serialize(serializer)
    }
}

impl From<Line> for LineDto {
    fn from(l: Line) -> Self {
        LineDto { from_x: l.from_x, from_y: l.from_y, to_x: l.to_x, to_y: l.to_y, color: l.color, line_width: l.line_width }
    }
}

impl From<Fill> for FillDto {
    fn from(f: Fill) -> Self {
        FillDto { x: f.x, y: f.y, color: f.color }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum DrawEventDto {
    Line(LineDto),
    Fill(FillDto),
}

impl From<DrawEvent> for DrawEventDto {
    fn from(ev: DrawEvent) -> Self {
        match ev {
            DrawEvent::Line(l) => DrawEventDto::Line(l.into()),
            DrawEvent::Fill(f) => DrawEventDto::Fill(f.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub display_name: String,
    pub score: i64,
    pub last_score: i64,
    pub rank: u32,
    pub role: PlayerRole,
    pub connected: bool,
}

impl From<PlayerView> for PlayerDto {
    fn from(p: PlayerView) -> Self {
        Self { id: p.id.to_string(), display_name: p.display_name, score: p.score, last_score: p.last_score, rank: p.rank, role: p.role, connected: p.connected }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyDto {
    pub game_state: LobbyStateKind,
    pub owner_id: String,
    pub round: u32,
    pub rounds: u32,
    pub round_end_time: i64,
    pub drawing_time_setting: u32,
    pub word_hints: Vec<WordHint>,
    pub players: Vec<PlayerDto>,
    pub current_drawing: Vec<DrawEventDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub allow_drawing: bool,
}

impl From<ReadyView> for ReadyDto {
    fn from(v: ReadyView) -> Self {
        Self {
            game_state: v.state,
            owner_id: v.owner_id.to_string(),
            round: v.round,
            rounds: v.rounds,
            round_end_time: v.round_end_relative_ms,
            drawing_time_setting: v.drawing_time_setting,
            word_hints: v.word_hints,
            players: v.players.into_iter().map(PlayerDto::from).collect(),
            current_drawing: v.current_drawing.into_iter().map(DrawEventDto::from).collect(),
            player_id: v.player_id.map(|id| id.to_string()),
            allow_drawing: v.allow_drawing,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub author: String,
    pub author_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTurnDto {
    pub round: u32,
    pub players: Vec<PlayerDto>,
    pub round_end_relative_ms: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOverResultDto {
    pub player_id: String,
    pub last_score: i64,
}

impl From<TurnOverResult> for TurnOverResultDto {
    fn from(r: TurnOverResult) -> Self {
        Self { player_id: r.player_id.to_string(), last_score: r.last_score }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOverDto {
    pub word: String,
    pub results: Vec<TurnOverResultDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KickDto {
    pub player_id: String,
    pub player_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerChangeDto {
    pub player_id: String,
    pub player_name: String,
}

pub type EditableSettingsDto = EditableSettings;

impl From<Outbound> for ServerMessage {
    fn from(ev: Outbound) -> Self {
        match ev {
            Outbound::Ready(view) => ServerMessage::Ready((*view).into()),
            Outbound::UpdatePlayers(players) => ServerMessage::UpdatePlayers(players.into_iter().map(PlayerDto::from).collect()),
            Outbound::UpdateWordHint(hints) => ServerMessage::UpdateWordhint(hints),
            Outbound::Message { author, author_id, content } => {
                ServerMessage::Message(MessageDto { author, author_id: author_id.to_string(), content })
            }
            Outbound::NonGuessingPlayerMessage { author, author_id, content } => {
                ServerMessage::NonGuessingPlayerMessage(MessageDto { author, author_id: author_id.to_string(), content })
            }
            Outbound::CorrectGuess(id) => ServerMessage::CorrectGuess(id.to_string()),
            Outbound::CloseGuess(s) => ServerMessage::CloseGuess(s),
            Outbound::Draw(DrawEvent::Line(l)) => ServerMessage::Line(l.into()),
            Outbound::Draw(DrawEvent::Fill(f)) => ServerMessage::Fill(f.into()),
            Outbound::Drawing(events) => ServerMessage::Drawing(events.into_iter().map(DrawEventDto::from).collect()),
            Outbound::YourTurn(words) => ServerMessage::YourTurn(words),
            Outbound::NextTurn { round, players, round_end_relative_ms } => {
                ServerMessage::NextTurn(NextTurnDto { round, players: players.into_iter().map(PlayerDto::from).collect(), round_end_relative_ms })
            }
            Outbound::TurnOver { word, results } => {
                ServerMessage::TurnOver(TurnOverDto { word, results: results.into_iter().map(TurnOverResultDto::from).collect() })
            }
            Outbound::GameOver(view) => ServerMessage::GameOver((*view).into()),
            Outbound::Kick { player_id, player_name } => ServerMessage::Kick(KickDto { player_id: player_id.to_string(), player_name }),
            Outbound::DrawerKicked => ServerMessage::DrawerKicked,
            Outbound::OwnerChange { player_id, player_name } => {
                ServerMessage::OwnerChange(OwnerChangeDto { player_id: player_id.to_string(), player_name })
            }
            Outbound::LobbySettingsChanged(settings) => ServerMessage::LobbySettingsChanged(settings),
            Outbound::Shutdown => ServerMessage::Shutdown,
            Outbound::SystemMessage(s) => ServerMessage::SystemMessage(s),
        }
    }
}
