// The lobby actor: wraps the pure `domain::lobby_state::LobbyState` behind a
// single serializing `tokio::sync::Mutex`, matching how `LobbyRegistry` guards
// its map. Every externally triggered mutation goes through here so ordering
// and fan-out stay consistent with the lock discipline.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::drawing::{Fill, Line};
use crate::domain::events::{Outbound, ReadyView};
use crate::domain::lobby_state::{AccessPolicy, Effect, EditableSettings, LobbyStateKind, Recipient, SettingsEdit, TURN_OVER_PAUSE_SECS, LobbyState};
use crate::domain::player::{ConnSender, Observer, PlayerRole, TrySendError, UserId};
use crate::use_cases::types::JoinError;

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

struct Inner {
    state: LobbyState,
    rng: StdRng,
}

/// Lock-guarded lobby aggregate plus the cheap, clone-free metadata the
/// registry and listing endpoint need without taking the lock.
pub struct Lobby {
    pub id: Arc<str>,
    pub creator_id: UserId,
    inner: Mutex<Inner>,
}

impl Lobby {
    pub fn new(id: Arc<str>, creator_id: UserId, settings: EditableSettings, access: AccessPolicy, custom_words: Vec<String>) -> Self {
        let mut rng = StdRng::from_entropy();
        let state = LobbyState::new(settings, access, custom_words, &mut rng);
        Self { id, creator_id, inner: Mutex::new(Inner { state, rng }) }
    }

    /// Runs `f` against the locked state, mirroring the reference `Synchronized` helper.
    pub async fn synchronized<R>(&self, f: impl FnOnce(&mut LobbyState) -> R) -> R {
        let mut inner = self.inner.lock().await;
        f(&mut inner.state)
    }

    pub async fn is_kicked(&self, user_id: &UserId) -> bool {
        self.synchronized(|s| s.is_kicked(user_id)).await
    }

    pub async fn has_free_slot(&self) -> bool {
        self.synchronized(|s| s.has_free_slot(Instant::now())).await
    }

    pub async fn owner_id(&self) -> Option<UserId> {
        self.synchronized(|s| s.owner_id.clone()).await
    }

    pub async fn access_policy(&self) -> AccessPolicy {
        self.synchronized(|s| s.access).await
    }

    pub async fn connected_count(&self) -> u32 {
        self.synchronized(|s| s.connected_count()).await
    }

    pub async fn is_public(&self) -> bool {
        self.synchronized(|s| s.settings.public).await
    }

    pub async fn summary(&self) -> (usize, u32, u32, u32) {
        self.synchronized(|s| (s.players.len(), s.settings.max_players, s.round, s.settings.rounds)).await
    }

    // -- Join / leave -----------------------------------------------------

    /// Capacity and kick checks only, without committing a join. Lets the
    /// caller run the (network-bound) follow/subscribe/ban checks in the
    /// spec's required order — capacity, kick, then external policy — before
    /// paying for a round trip to the identity provider.
    pub async fn join_precheck(&self, user_id: &UserId) -> Result<(), JoinError> {
        self.synchronized(|s| {
            let already_present = s.find_player(user_id).is_some();
            if !already_present && !s.has_free_slot(Instant::now()) {
                return Err(JoinError::LobbyFull);
            }
            if s.is_kicked(user_id) {
                return Err(JoinError::Kicked);
            }
            Ok(())
        })
        .await
    }

    pub async fn join(&self, user_id: UserId, display_name: String, moderator: bool, sender: ConnSender) -> Result<ReadyView, JoinError> {
        let mut inner = self.inner.lock().await;
        let already_present = inner.state.find_player(&user_id).is_some();
        if !already_present && !inner.state.has_free_slot(Instant::now()) {
            return Err(JoinError::LobbyFull);
        }
        if inner.state.is_kicked(&user_id) {
            return Err(JoinError::Kicked);
        }

        if !already_present {
            inner.state.admit_player(user_id.clone(), display_name, moderator);
        }

        if let Some(p) = inner.state.find_player_mut(&user_id) {
            p.conn.attach(sender);
            p.moderator = moderator;
        }
        inner.state.recalculate_ranks();
        let view = inner.state.ready_view_for(Some(user_id));

        // A connect into a drawerless Ongoing lobby (every player had
        // disconnected mid-turn) re-triggers `advance` so the game doesn't
        // stay wedged without a drawer.
        if inner.state.state == LobbyStateKind::Ongoing && inner.state.drawer_idx.is_none() {
            let Inner { state, rng } = &mut *inner;
            let effects = state.advance(now_ms(), rng);
            self.apply_effects(&mut inner.state, effects).await;
        } else {
            let players = inner.state.player_views();
            self.dispatch(&inner.state, &[Effect { to: Recipient::AllMembers, message: Outbound::UpdatePlayers(players) }]);
        }
        Ok(view)
    }

    pub async fn join_observer(&self, observer_id: UserId, sender: ConnSender) -> ReadyView {
        let mut inner = self.inner.lock().await;
        if inner.state.observers.iter().any(|o| o.id == observer_id) {
            if let Some(o) = inner.state.observers.iter_mut().find(|o| o.id == observer_id) {
                o.conn.attach(sender);
            }
        } else {
            let mut observer = Observer::new(observer_id.clone());
            observer.conn.attach(sender);
            inner.state.observers.push(observer);
        }
        inner.state.ready_view_for(None)
    }

    pub async fn on_player_disconnect(&self, user_id: &UserId) {
        let mut inner = self.inner.lock().await;
        let Some(p) = inner.state.find_player_mut(user_id) else { return };
        if !p.conn.connected {
            return;
        }
        p.conn.detach();
        inner.state.last_player_disconnect_at = Some(Instant::now());
        let players = inner.state.player_views();
        self.dispatch(&inner.state, &[Effect { to: Recipient::AllMembers, message: Outbound::UpdatePlayers(players) }]);
    }

    pub async fn on_observer_disconnect(&self, observer_id: &UserId) {
        let mut inner = self.inner.lock().await;
        inner.state.observers.retain(|o| o.id != *observer_id);
    }

    // -- Event ingestion ---------------------------------------------------

    pub async fn handle_start(&self, sender: &UserId) {
        let mut inner = self.inner.lock().await;
        if inner.state.owner_id.as_ref() != Some(sender) || inner.state.state == LobbyStateKind::Ongoing {
            return;
        }
        let effects = {
            let Inner { state, rng } = &mut *inner;
            state.start(now_ms(), rng)
        };
        self.apply_effects(&mut inner.state, effects).await;
    }

    pub async fn handle_line(&self, sender: &UserId, line: Line) {
        let mut inner = self.inner.lock().await;
        let effects = inner.state.handle_line(sender, line);
        self.dispatch(&inner.state, &effects);
    }

    pub async fn handle_fill(&self, sender: &UserId, fill: Fill) {
        let mut inner = self.inner.lock().await;
        let effects = inner.state.handle_fill(sender, fill);
        self.dispatch(&inner.state, &effects);
    }

    pub async fn handle_clear(&self, sender: &UserId) {
        let mut inner = self.inner.lock().await;
        let effects = inner.state.handle_clear(sender);
        self.dispatch(&inner.state, &effects);
    }

    pub async fn handle_undo(&self, sender: &UserId) {
        let mut inner = self.inner.lock().await;
        let effects = inner.state.handle_undo(sender);
        self.dispatch(&inner.state, &effects);
    }

    pub async fn handle_request_drawing(&self, sender: &UserId) {
        let inner = self.inner.lock().await;
        let effects = inner.state.handle_request_drawing(sender);
        self.dispatch(&inner.state, &effects);
    }

    pub async fn handle_choose_word(&self, sender: &UserId, index: usize) {
        let mut inner = self.inner.lock().await;
        let effects = inner.state.choose_word(sender, index);
        self.dispatch(&inner.state, &effects);
    }

    pub async fn handle_message(&self, sender: &UserId, text: &str) {
        let mut inner = self.inner.lock().await;
        let effects = {
            let Inner { state, rng } = &mut *inner;
            state.handle_message(sender, text, now_ms(), rng)
        };
        self.apply_effects(&mut inner.state, effects).await;
    }

    pub async fn handle_kick(&self, sender: &UserId, target: &UserId) {
        let mut inner = self.inner.lock().await;
        let authorized = {
            let is_creator = inner.state.creator_id.as_ref() == Some(sender);
            let target_player = inner.state.find_player(target);
            let target_is_moderator = target_player.map(|p| p.moderator).unwrap_or(false);
            let sender_is_moderator = inner.state.find_player(sender).map(|p| p.moderator).unwrap_or(false);
            sender != target && (is_creator || (sender_is_moderator && !target_is_moderator))
        };
        if !authorized {
            return;
        }
        let effects = {
            let Inner { state, rng } = &mut *inner;
            state.kick(target, now_ms(), rng)
        };
        self.apply_effects(&mut inner.state, effects).await;
    }

    pub async fn handle_edit_settings(&self, sender: &UserId, edit: SettingsEdit) {
        let mut inner = self.inner.lock().await;
        let effects = {
            let Inner { state, rng } = &mut *inner;
            state.edit_settings(sender, edit, rng)
        };
        self.dispatch(&inner.state, &effects);
    }

    /// Called once per second by the lobby's ticker task.
    pub async fn tick(&self) {
        let mut inner = self.inner.lock().await;
        let deadline_passed = inner.state.turn_deadline_passed(now_ms());
        let effects = if deadline_passed {
            let Inner { state, rng } = &mut *inner;
            state.advance(now_ms(), rng)
        } else {
            let Inner { state, rng } = &mut *inner;
            state.maybe_reveal_hint(now_ms(), rng)
        };
        if deadline_passed {
            self.apply_effects(&mut inner.state, effects).await;
        } else {
            self.dispatch(&inner.state, &effects);
        }
    }

    pub async fn shutdown(&self) {
        let inner = self.inner.lock().await;
        self.dispatch(&inner.state, &[Effect { to: Recipient::AllMembers, message: Outbound::Shutdown }]);
    }

    // -- Fan-out ------------------------------------------------------------

    /// Dispatches `effects`, pausing `TURN_OVER_PAUSE_SECS` after a turn-over
    /// announcement so clients can show results before the next turn starts,
    /// per the reference timing. The lobby lock (held by the caller via
    /// `inner`) stays held for the whole pause: everything queues.
    async fn apply_effects(&self, state: &mut LobbyState, effects: Vec<Effect>) {
        if let Some(pos) = effects.iter().position(|e| matches!(e.message, Outbound::TurnOver { .. })) {
            let (head, tail) = effects.split_at(pos + 1);
            self.dispatch(state, head);
            tokio::time::sleep(Duration::from_secs(TURN_OVER_PAUSE_SECS)).await;
            self.dispatch(state, tail);
        } else {
            self.dispatch(state, &effects);
        }
    }

    fn dispatch(&self, state: &LobbyState, effects: &[Effect]) {
        for eff in effects {
            match &eff.to {
                Recipient::AllMembers => {
                    for p in &state.players {
                        self.send(p.id.as_ref(), &p.conn, eff.message.clone());
                    }
                    for o in &state.observers {
                        self.send(o.id.as_ref(), &o.conn, eff.message.clone());
                    }
                }
                Recipient::AllExcept(skip) => {
                    for p in state.players.iter().filter(|p| p.id != *skip) {
                        self.send(p.id.as_ref(), &p.conn, eff.message.clone());
                    }
                    for o in &state.observers {
                        self.send(o.id.as_ref(), &o.conn, eff.message.clone());
                    }
                }
                Recipient::Only(id) => {
                    if let Some(p) = state.find_player(id) {
                        self.send(p.id.as_ref(), &p.conn, eff.message.clone());
                    } else if let Some(o) = state.observers.iter().find(|o| o.id == *id) {
                        self.send(o.id.as_ref(), &o.conn, eff.message.clone());
                    }
                }
                Recipient::Guessers => {
                    for p in state.players.iter().filter(|p| p.role == PlayerRole::Guessing) {
                        self.send(p.id.as_ref(), &p.conn, eff.message.clone());
                    }
                }
                Recipient::GuessersAndObservers => {
                    for p in state.players.iter().filter(|p| p.role == PlayerRole::Guessing) {
                        self.send(p.id.as_ref(), &p.conn, eff.message.clone());
                    }
                    for o in &state.observers {
                        self.send(o.id.as_ref(), &o.conn, eff.message.clone());
                    }
                }
                Recipient::DrawerAndStandby => {
                    for p in state.players.iter().filter(|p| matches!(p.role, PlayerRole::Drawing | PlayerRole::Standby)) {
                        self.send(p.id.as_ref(), &p.conn, eff.message.clone());
                    }
                }
            }
        }
    }

    fn send(&self, id: &str, conn: &crate::domain::player::Connection, msg: Outbound) {
        match conn.try_send(msg) {
            Ok(()) | Err(TrySendError::NotConnected) => {}
            Err(TrySendError::Full) => warn!(player_id = id, "outbound channel full; dropping message"),
        }
    }
}

impl std::fmt::Debug for Lobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lobby").field("id", &self.id).finish()
    }
}

/// Spawns the per-lobby 1 Hz ticker. Stops once the lobby has been dropped
/// from the registry (weak upgrade fails).
pub fn spawn_ticker(lobby: Arc<Lobby>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            if Arc::strong_count(&lobby) == 1 {
                debug!(lobby_id = %lobby.id, "ticker stopping; lobby has no other owners");
                break;
            }
            lobby.tick().await;
        }
    });
}
