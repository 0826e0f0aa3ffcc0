// Use-case level outcomes for the join path; kept separate from the domain
// layer because they describe *why* an operation was refused, not state.

use crate::domain::events::ReadyView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    LobbyFull,
    Kicked,
    FollowersOnly,
    SubscribersOnly,
    Banned,
    UpstreamUnavailable,
}

impl JoinError {
    pub fn reason(&self) -> &'static str {
        match self {
            JoinError::LobbyFull => "lobby is full",
            JoinError::Kicked => "you have been kicked from this lobby",
            JoinError::FollowersOnly => "this lobby is followers-only",
            JoinError::SubscribersOnly => "this lobby is subscribers-only",
            JoinError::Banned => "you are banned from this channel",
            JoinError::UpstreamUnavailable => "could not verify join eligibility",
        }
    }
}

#[derive(Debug, Clone)]
pub enum JoinOutcome {
    Joined(Box<ReadyView>),
    Refused(JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryStats {
    pub total_lobbies: usize,
    pub total_connections: usize,
}

#[derive(Debug, Clone)]
pub struct LobbySummary {
    pub id: std::sync::Arc<str>,
    pub player_count: usize,
    pub max_players: u32,
    pub round: u32,
    pub rounds: u32,
}
