// Domain-level membership types: players, observers, and their role transitions.

use std::time::Instant;
use tokio::sync::mpsc;

use crate::domain::events::Outbound;

/// Opaque identity for an authenticated participant, as handed to us by auth.
pub type UserId = std::sync::Arc<str>;

/// A player's role within the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    Guessing,
    Drawing,
    Standby,
}

/// Outbound channel into a single connected socket's writer task.
///
/// Cloning is cheap; the sender end is shared between the lobby (for fan-out)
/// and whichever connection currently owns the slot. Sends never block the
/// lobby lock: a full channel is dropped-and-logged by the caller.
pub type ConnSender = mpsc::Sender<Outbound>;

#[derive(Debug, Default)]
pub struct Connection {
    sender: Option<ConnSender>,
    pub connected: bool,
    pub disconnected_at: Option<Instant>,
}

impl Connection {
    pub fn attach(&mut self, sender: ConnSender) {
        self.sender = Some(sender);
        self.connected = true;
        self.disconnected_at = None;
    }

    pub fn detach(&mut self) {
        self.sender = None;
        self.connected = false;
        self.disconnected_at = Some(Instant::now());
    }

    /// Best-effort, non-blocking send. Drops the message (caller logs) if the
    /// socket's writer task is lagging behind.
    pub fn try_send(&self, msg: Outbound) -> Result<(), TrySendError> {
        match &self.sender {
            None => Err(TrySendError::NotConnected),
            Some(tx) => tx.try_send(msg).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TrySendError::Full,
                mpsc::error::TrySendError::Closed(_) => TrySendError::NotConnected,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrySendError {
    NotConnected,
    Full,
}

#[derive(Debug)]
pub struct Player {
    pub id: UserId,
    pub display_name: String,
    pub score: i64,
    pub last_score: i64,
    pub rank: u32,
    pub role: PlayerRole,
    pub moderator: bool,
    pub conn: Connection,
}

impl Player {
    pub fn new(id: UserId, display_name: String, moderator: bool) -> Self {
        Self {
            id,
            display_name,
            score: 0,
            last_score: 0,
            rank: 1,
            role: PlayerRole::Guessing,
            moderator,
            conn: Connection::default(),
        }
    }
}

#[derive(Debug)]
pub struct Observer {
    pub id: UserId,
    pub conn: Connection,
}

impl Observer {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            conn: Connection::default(),
        }
    }
}

/// Snapshot of a user barred from rejoining a lobby for its lifetime.
#[derive(Debug, Clone)]
pub struct KickRecord {
    pub user_id: UserId,
    pub display_name: String,
}
