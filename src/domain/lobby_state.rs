// The lobby's pure, synchronous state machine: settings, membership, the
// current turn, and every mutation the event-ingestion layer can trigger.
// No I/O happens here; mutations return a list of `Effect`s (who should be
// told what) for the async command layer in `use_cases::lobby` to dispatch.

use rand::Rng;
use std::time::Instant;

use crate::domain::drawing::{DrawingBuffer, Fill, Line};
use crate::domain::events::{Outbound, PlayerView, ReadyView, TurnOverResult};
use crate::domain::hint::{self, WordHint};
use crate::domain::player::{KickRecord, Observer, Player, PlayerRole, UserId};
use crate::domain::words::{self, CustomWordPool, Language};

pub const MIN_PLAYERS: u32 = 2;
pub const MAX_PLAYERS: u32 = 24;
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 20;
pub const MIN_DRAWING_TIME: u32 = 60;
pub const MAX_DRAWING_TIME: u32 = 300;

/// How long a disconnected player's seat is preserved before the slot counts
/// as free again, mirroring the original `slotReservationTime`.
pub const SLOT_RESERVATION_SECS: u64 = 300;

pub const TURN_OVER_PAUSE_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LobbyStateKind {
    Unstarted,
    Ongoing,
    GameOver,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EditableSettings {
    pub max_players: u32,
    pub rounds: u32,
    pub drawing_time: u32,
    pub public: bool,
    pub custom_words_chance: u8,
    pub language: Language,
}

impl Default for EditableSettings {
    fn default() -> Self {
        Self {
            max_players: 12,
            rounds: 3,
            drawing_time: 120,
            public: false,
            custom_words_chance: 0,
            language: Language::English,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[derive(Default)]
pub struct AccessPolicy {
    pub followers_only: bool,
    pub subscribers_only: bool,
}

/// A settings-edit request (§6.2); `None` fields are left unchanged.
/// Bounds are validated before anything is applied.
#[derive(Debug, Clone, Default)]
pub struct SettingsEdit {
    pub max_players: Option<u32>,
    pub rounds: Option<u32>,
    pub drawing_time: Option<u32>,
    pub public: Option<bool>,
    pub custom_words_chance: Option<u8>,
    pub language: Option<Language>,
    pub custom_words: Option<Vec<String>>,
    pub followers_only: Option<bool>,
    pub subscribers_only: Option<bool>,
}

/// Who an `Effect` should be fanned out to.
#[derive(Debug, Clone)]
pub enum Recipient {
    AllMembers,
    AllExcept(UserId),
    Only(UserId),
    Guessers,
    DrawerAndStandby,
    GuessersAndObservers,
}

#[derive(Debug, Clone)]
pub struct Effect {
    pub to: Recipient,
    pub message: Outbound,
}

fn effect(to: Recipient, message: Outbound) -> Effect {
    Effect { to, message }
}

pub struct LobbyState {
    pub settings: EditableSettings,
    pub pending_drawing_time: Option<u32>,
    pub access: AccessPolicy,
    pub round: u32,
    pub state: LobbyStateKind,
    pub players: Vec<Player>,
    pub observers: Vec<Observer>,
    pub drawer_idx: Option<usize>,
    pub owner_id: Option<UserId>,
    pub creator_id: Option<UserId>,
    pub current_word: Option<String>,
    pub word_choice: Vec<String>,
    pub guesser_hints: Vec<WordHint>,
    pub drawer_hints: Vec<WordHint>,
    pub hints_remaining: u32,
    pub hint_count: u32,
    pub round_end_ms: i64,
    pub drawing: DrawingBuffer,
    pub guessers_score_accumulator: i64,
    pub last_player_disconnect_at: Option<Instant>,
    pub kicked: Vec<KickRecord>,
    pub custom_pool: CustomWordPool,
}

impl LobbyState {
    pub fn new(settings: EditableSettings, access: AccessPolicy, custom_words: Vec<String>, rng: &mut impl Rng) -> Self {
        Self {
            settings,
            pending_drawing_time: None,
            access,
            round: 0,
            state: LobbyStateKind::Unstarted,
            players: Vec::new(),
            observers: Vec::new(),
            drawer_idx: None,
            owner_id: None,
            creator_id: None,
            current_word: None,
            word_choice: Vec::new(),
            guesser_hints: Vec::new(),
            drawer_hints: Vec::new(),
            hints_remaining: 0,
            hint_count: 0,
            round_end_ms: 0,
            drawing: DrawingBuffer::default(),
            guessers_score_accumulator: 0,
            last_player_disconnect_at: None,
            kicked: Vec::new(),
            custom_pool: CustomWordPool::new(custom_words, rng),
        }
    }

    // -- Membership ---------------------------------------------------

    pub fn find_player(&self, id: &UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn find_player_mut(&mut self, id: &UserId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    pub fn player_index(&self, id: &UserId) -> Option<usize> {
        self.players.iter().position(|p| p.id == *id)
    }

    pub fn is_kicked(&self, id: &UserId) -> bool {
        self.kicked.iter().any(|k| k.user_id == *id)
    }

    pub fn connected_count(&self) -> u32 {
        self.players.iter().filter(|p| p.conn.connected).count() as u32
    }

    pub fn occupied_slots(&self, now: Instant) -> u32 {
        self.players
            .iter()
            .filter(|p| {
                p.conn.connected
                    || p.conn
                        .disconnected_at
                        .map(|t| now.duration_since(t).as_secs() < SLOT_RESERVATION_SECS)
                        .unwrap_or(true)
            })
            .count() as u32
    }

    pub fn has_free_slot(&self, now: Instant) -> bool {
        (self.players.len() as u32) < self.settings.max_players || self.occupied_slots(now) < self.settings.max_players
    }

    /// Admits a brand-new player (never seen before in this lobby). Returns
    /// `None` if the user was already admitted — callers should reconnect
    /// instead of re-joining.
    pub fn admit_player(&mut self, id: UserId, display_name: String, moderator: bool) -> Option<()> {
        if self.find_player(&id).is_some() {
            return None;
        }
        let is_first = self.players.is_empty();
        self.players.push(Player::new(id.clone(), display_name, moderator));
        if is_first {
            self.owner_id = Some(id.clone());
            self.creator_id = Some(id);
        }
        Some(())
    }

    // -- Ranking --------------------------------------------------------

    pub fn recalculate_ranks(&mut self) {
        crate::domain::rank::recalculate(&mut self.players);
    }

    // -- Player view building --------------------------------------------

    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .map(|p| PlayerView {
                id: p.id.clone(),
                display_name: p.display_name.clone(),
                score: p.score,
                last_score: p.last_score,
                rank: p.rank,
                role: p.role,
                connected: p.conn.connected,
            })
            .collect()
    }

    pub fn ready_view_for(&self, player_id: Option<UserId>) -> ReadyView {
        let allow_drawing = player_id
            .as_ref()
            .map(|id| self.drawer_idx.map(|i| self.players[i].id == *id).unwrap_or(false))
            .unwrap_or(false);
        let word_hints = match &player_id {
            Some(id) if allow_drawing || self.is_standby(id) => self.drawer_hints.clone(),
            _ => self.guesser_hints.clone(),
        };
        ReadyView {
            state: self.state,
            owner_id: self.owner_id.clone().unwrap_or_else(|| "".into()),
            round: self.round,
            rounds: self.settings.rounds,
            round_end_relative_ms: if self.state == LobbyStateKind::Ongoing { self.round_end_ms } else { 0 },
            drawing_time_setting: self.settings.drawing_time,
            word_hints,
            players: self.player_views(),
            current_drawing: self.drawing.events().to_vec(),
            player_id,
            allow_drawing,
        }
    }

    fn is_standby(&self, id: &UserId) -> bool {
        self.find_player(id).map(|p| p.role == PlayerRole::Standby).unwrap_or(false)
    }

    // -- Turn state machine -----------------------------------------------

    /// `Unstarted -> Ongoing`: resets scores/ranks/round then advances.
    pub fn start(&mut self, now_ms: i64, rng: &mut impl Rng) -> Vec<Effect> {
        for p in &mut self.players {
            p.score = 0;
            p.last_score = 0;
            p.rank = 1;
        }
        self.round = 0;
        self.advance(now_ms, rng)
    }

    /// Picks the next drawer and whether the round rolled over, without
    /// mutating anything — used both by `advance` and by kick handling,
    /// which needs to compute this *before* removing the kicked player.
    fn next_drawer(&self) -> (Option<usize>, bool) {
        match self.drawer_idx {
            Some(current) => {
                let after = self.players[current + 1..]
                    .iter()
                    .position(|p| p.conn.connected)
                    .map(|i| current + 1 + i);
                match after {
                    Some(idx) => (Some(idx), false),
                    None => {
                        let head = self.players.iter().position(|p| p.conn.connected);
                        (head.or(if self.players.is_empty() { None } else { Some(0) }), true)
                    }
                }
            }
            None => {
                let head = self.players.iter().position(|p| p.conn.connected);
                (head.or(if self.players.is_empty() { None } else { Some(0) }), true)
            }
        }
    }

    /// The turn-end -> next-turn transition. See SPEC_FULL.md §4.3 for the
    /// step-by-step description this function follows.
    pub fn advance(&mut self, now_ms: i64, rng: &mut impl Rng) -> Vec<Effect> {
        let mut effects = Vec::new();
        let (next_idx, round_over) = self.next_drawer();

        // 2. Score the outgoing drawer.
        if let Some(drawer_idx) = self.drawer_idx {
            let drawer_connected = self.players[drawer_idx].conn.connected;
            let denominator = self.connected_count().saturating_sub(if drawer_connected { 1 } else { 0 });
            let score = crate::domain::scoring::drawer_score(self.guessers_score_accumulator, denominator);
            self.players[drawer_idx].last_score = score;
            self.players[drawer_idx].score += score;
        }

        // 3. Turn-over announcement (only if a word was actually in play).
        if let Some(word) = self.current_word.take() {
            let results = self
                .players
                .iter()
                .map(|p| TurnOverResult {
                    player_id: p.id.clone(),
                    last_score: p.last_score,
                })
                .collect();
            effects.push(effect(Recipient::AllMembers, Outbound::TurnOver { word, results }));
        }

        // 4. Clear word/hints, apply pending drawing time, reset accumulator.
        self.word_choice.clear();
        self.guesser_hints.clear();
        self.drawer_hints.clear();
        self.hints_remaining = 0;
        self.hint_count = 0;
        if let Some(pending) = self.pending_drawing_time.take() {
            self.settings.drawing_time = pending;
        }
        self.guessers_score_accumulator = 0;

        // 5. Reset role state for the next turn.
        for p in &mut self.players {
            if p.role == PlayerRole::Guessing {
                p.last_score = 0;
            }
            p.role = PlayerRole::Guessing;
        }

        // 6. Ranks.
        self.recalculate_ranks();

        // 7. Game-over check.
        if round_over && self.round == self.settings.rounds {
            self.state = LobbyStateKind::GameOver;
            self.drawer_idx = None;
            for p in self.players.iter().filter(|p| p.conn.connected) {
                effects.push(effect(
                    Recipient::Only(p.id.clone()),
                    Outbound::GameOver(Box::new(self.ready_view_for(Some(p.id.clone())))),
                ));
            }
            return effects;
        }

        // 8. Round rollover.
        if round_over {
            self.round += 1;
        }

        // 9. Clear drawing, assign new drawer.
        self.drawing.clear();
        self.drawer_idx = next_idx;
        if let Some(idx) = self.drawer_idx {
            self.players[idx].role = PlayerRole::Drawing;
        }
        self.state = LobbyStateKind::Ongoing;

        // 10. Choose words and set the deadline.
        if self.drawer_idx.is_some() {
            self.word_choice = words::get_random_words(
                3,
                self.settings.language,
                self.settings.custom_words_chance,
                &mut self.custom_pool,
                rng,
            );
            self.round_end_ms = now_ms + self.settings.drawing_time as i64 * 1000;
        }

        // 11. Broadcast next-turn / your-turn.
        effects.push(effect(
            Recipient::AllMembers,
            Outbound::NextTurn {
                round: self.round,
                players: self.player_views(),
                round_end_relative_ms: self.round_end_ms - now_ms,
            },
        ));
        if let Some(idx) = self.drawer_idx {
            effects.push(effect(
                Recipient::Only(self.players[idx].id.clone()),
                Outbound::YourTurn(self.word_choice.clone()),
            ));
        }

        effects
    }

    /// `choose-word i`: only valid from the drawer while a choice vector exists.
    pub fn choose_word(&mut self, sender: &UserId, index: usize) -> Vec<Effect> {
        let Some(drawer_idx) = self.drawer_idx else { return Vec::new() };
        if self.players[drawer_idx].id != *sender || self.word_choice.is_empty() {
            return Vec::new();
        }
        let Some(word) = self.word_choice.get(index).cloned() else {
            return vec![effect(
                Recipient::Only(sender.clone()),
                Outbound::SystemMessage("invalid word choice index".to_string()),
            )];
        };

        let rune_len = word.chars().count();
        self.hint_count = hint::hint_count_for(rune_len);
        self.hints_remaining = self.hint_count;
        let (guesser_view, drawer_view) = hint::build_views(&word);
        self.guesser_hints = guesser_view;
        self.drawer_hints = drawer_view;
        self.word_choice.clear();
        self.current_word = Some(word);

        vec![
            effect(Recipient::GuessersAndObservers, Outbound::UpdateWordHint(self.guesser_hints.clone())),
            effect(Recipient::DrawerAndStandby, Outbound::UpdateWordHint(self.drawer_hints.clone())),
        ]
    }

    /// Reveals one hint if the reveal cadence calls for it. Returns effects
    /// (empty if nothing was due).
    pub fn maybe_reveal_hint(&mut self, now_ms: i64, rng: &mut impl Rng) -> Vec<Effect> {
        if self.current_word.is_none() || self.hints_remaining == 0 {
            return Vec::new();
        }
        let time_left_ms = self.round_end_ms - now_ms;
        let drawing_time_ms = self.settings.drawing_time as i64 * 1000;
        if !hint::reveal_due(time_left_ms, self.hints_remaining, self.hint_count, drawing_time_ms) {
            return Vec::new();
        }
        let word = self.current_word.clone().unwrap_or_default();
        if hint::reveal_one(&mut self.guesser_hints, &word, rng) {
            self.hints_remaining -= 1;
            vec![effect(
                Recipient::GuessersAndObservers,
                Outbound::UpdateWordHint(self.guesser_hints.clone()),
            )]
        } else {
            Vec::new()
        }
    }

    /// Whether the ticker should end the turn right now.
    pub fn turn_deadline_passed(&self, now_ms: i64) -> bool {
        self.state == LobbyStateKind::Ongoing && now_ms >= self.round_end_ms
    }

    // -- Drawing events ------------------------------------------------------

    pub fn is_current_drawer(&self, id: &UserId) -> bool {
        self.drawer_idx.map(|i| self.players[i].id == *id).unwrap_or(false)
    }

    pub fn can_draw(&self, id: &UserId) -> bool {
        self.is_current_drawer(id) && self.current_word.is_some()
    }

    pub fn handle_line(&mut self, sender: &UserId, line: Line) -> Vec<Effect> {
        if !self.can_draw(sender) {
            return Vec::new();
        }
        self.drawing.push_line(line);
        vec![effect(Recipient::AllExcept(sender.clone()), Outbound::Draw(self.drawing.events().last().cloned().unwrap()))]
    }

    pub fn handle_fill(&mut self, sender: &UserId, fill: Fill) -> Vec<Effect> {
        if !self.can_draw(sender) {
            return Vec::new();
        }
        self.drawing.push_fill(fill);
        vec![effect(Recipient::AllExcept(sender.clone()), Outbound::Draw(self.drawing.events().last().cloned().unwrap()))]
    }

    pub fn handle_clear(&mut self, sender: &UserId) -> Vec<Effect> {
        if !self.can_draw(sender) || self.drawing.is_empty() {
            return Vec::new();
        }
        self.drawing.clear();
        vec![effect(Recipient::AllMembers, Outbound::Drawing(Vec::new()))]
    }

    pub fn handle_undo(&mut self, sender: &UserId) -> Vec<Effect> {
        if !self.can_draw(sender) {
            return Vec::new();
        }
        if !self.drawing.undo() {
            return Vec::new();
        }
        vec![effect(Recipient::AllMembers, Outbound::Drawing(self.drawing.events().to_vec()))]
    }

    pub fn handle_request_drawing(&self, sender: &UserId) -> Vec<Effect> {
        vec![effect(Recipient::Only(sender.clone()), Outbound::Drawing(self.drawing.events().to_vec()))]
    }

    // -- Chat / guessing -------------------------------------------------------

    pub fn handle_message(&mut self, sender: &UserId, text: &str, now_ms: i64, rng: &mut impl Rng) -> Vec<Effect> {
        let trimmed = text.trim();
        if text.len() > 10_000 || trimmed.is_empty() {
            return Vec::new();
        }
        let Some(sender_player) = self.find_player(sender) else { return Vec::new() };
        let author = sender_player.display_name.clone();
        let author_id = sender_player.id.clone();
        let role = sender_player.role;

        let Some(word) = self.current_word.clone() else {
            return vec![effect(
                Recipient::AllMembers,
                Outbound::Message { author, author_id, content: trimmed.to_string() },
            )];
        };

        if role != PlayerRole::Guessing {
            return vec![effect(
                Recipient::DrawerAndStandby,
                Outbound::NonGuessingPlayerMessage { author, author_id, content: trimmed.to_string() },
            )];
        }

        let normalized_guess = crate::domain::normalize::simplify(trimmed);
        let normalized_word = crate::domain::normalize::simplify(&word);

        if normalized_guess == normalized_word {
            return self.handle_correct_guess(sender, now_ms, rng);
        }

        if crate::domain::normalize::levenshtein(&normalized_guess, &normalized_word) == 1 {
            return vec![
                effect(
                    Recipient::AllMembers,
                    Outbound::Message { author, author_id: author_id.clone(), content: trimmed.to_string() },
                ),
                effect(Recipient::Only(author_id), Outbound::CloseGuess(trimmed.to_string())),
            ];
        }

        vec![effect(Recipient::AllMembers, Outbound::Message { author, author_id, content: trimmed.to_string() })]
    }

    fn handle_correct_guess(&mut self, sender: &UserId, now_ms: i64, rng: &mut impl Rng) -> Vec<Effect> {
        let mut effects = Vec::new();
        let seconds_left = ((self.round_end_ms - now_ms).max(0) / 1000) as u32;

        {
            let player = self.find_player_mut(sender).expect("sender validated by caller");
            player.role = PlayerRole::Standby;
        }

        let score = crate::domain::scoring::guesser_score(
            self.settings.drawing_time,
            seconds_left,
            self.hint_count,
            self.hints_remaining,
        );
        {
            let player = self.find_player_mut(sender).expect("sender validated by caller");
            player.score += score;
            player.last_score = score;
        }
        self.guessers_score_accumulator += score;

        effects.push(effect(Recipient::AllMembers, Outbound::CorrectGuess(sender.clone())));

        let any_guessing_connected = self
            .players
            .iter()
            .any(|p| p.role == PlayerRole::Guessing && p.conn.connected);

        if !any_guessing_connected {
            effects.extend(self.advance(now_ms, rng));
        } else {
            self.recalculate_ranks();
            effects.push(effect(
                Recipient::Only(sender.clone()),
                Outbound::UpdateWordHint(self.drawer_hints.clone()),
            ));
            effects.push(effect(Recipient::AllMembers, Outbound::UpdatePlayers(self.player_views())));
        }

        effects
    }

    // -- Kick handling -----------------------------------------------------

    /// Removes `target` from the lobby, applying drawer/owner-reassignment
    /// and score-penalty-reversal rules. `sender` must already have been
    /// authorized by the caller (creator, or moderator targeting a
    /// non-moderator/non-self).
    pub fn kick(&mut self, target: &UserId, now_ms: i64, rng: &mut impl Rng) -> Vec<Effect> {
        let Some(idx) = self.player_index(target) else { return Vec::new() };
        let mut effects = Vec::new();

        let kicked_player = &self.players[idx];
        self.kicked.push(KickRecord {
            user_id: kicked_player.id.clone(),
            display_name: kicked_player.display_name.clone(),
        });
        effects.push(effect(
            Recipient::Only(target.clone()),
            Outbound::Kick { player_id: kicked_player.id.clone(), player_name: kicked_player.display_name.clone() },
        ));

        let was_owner = self.owner_id.as_deref() == Some(target);
        let was_drawer = self.is_current_drawer(target);

        if was_drawer {
            let (next_idx_before_removal, round_over) = self.next_drawer();
            let next_id = next_idx_before_removal.map(|i| self.players[i].id.clone());

            self.players.remove(idx);
            self.drawer_idx = None;

            for p in &mut self.players {
                p.score -= p.last_score;
                p.last_score = 0;
            }
            self.guessers_score_accumulator = 0;

            effects.push(effect(Recipient::AllMembers, Outbound::DrawerKicked));

            self.reassign_owner_if_needed(was_owner, &mut effects);

            effects.extend(self.advance_with_known_next(next_id, round_over, now_ms, rng));
        } else {
            self.players.remove(idx);
            self.reassign_owner_if_needed(was_owner, &mut effects);

            let any_guessing_connected = self
                .players
                .iter()
                .any(|p| p.role == PlayerRole::Guessing && p.conn.connected);
            if any_guessing_connected {
                self.recalculate_ranks();
                effects.push(effect(Recipient::AllMembers, Outbound::UpdatePlayers(self.player_views())));
            } else {
                effects.extend(self.advance(now_ms, rng));
            }
        }

        effects
    }

    fn reassign_owner_if_needed(&mut self, was_owner: bool, effects: &mut Vec<Effect>) {
        if !was_owner {
            return;
        }
        let new_owner = self.players.iter().find(|p| p.conn.connected).map(|p| p.id.clone());
        self.owner_id = new_owner.clone();
        if let Some(id) = new_owner {
            let name = self.find_player(&id).map(|p| p.display_name.clone()).unwrap_or_default();
            effects.push(effect(Recipient::AllMembers, Outbound::OwnerChange { player_id: id, player_name: name }));
        }
    }

    /// Like `advance`, but the next-drawer was already computed before the
    /// kicked player was removed from the list (kick handling needs that —
    /// removal shifts indices out from under a freshly recomputed pick).
    fn advance_with_known_next(&mut self, next_id: Option<UserId>, round_over: bool, now_ms: i64, rng: &mut impl Rng) -> Vec<Effect> {
        let next_idx = next_id.and_then(|id| self.player_index(&id));
        self.run_advance_body(next_idx, round_over, now_ms, rng)
    }

    /// Shared tail of `advance`/`advance_with_known_next` from step 2 onward,
    /// parameterized on an already-decided (next_idx, round_over).
    fn run_advance_body(&mut self, next_idx: Option<usize>, round_over: bool, now_ms: i64, rng: &mut impl Rng) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(word) = self.current_word.take() {
            let results = self
                .players
                .iter()
                .map(|p| TurnOverResult { player_id: p.id.clone(), last_score: p.last_score })
                .collect();
            effects.push(effect(Recipient::AllMembers, Outbound::TurnOver { word, results }));
        }

        self.word_choice.clear();
        self.guesser_hints.clear();
        self.drawer_hints.clear();
        self.hints_remaining = 0;
        self.hint_count = 0;
        if let Some(pending) = self.pending_drawing_time.take() {
            self.settings.drawing_time = pending;
        }
        self.guessers_score_accumulator = 0;

        for p in &mut self.players {
            if p.role == PlayerRole::Guessing {
                p.last_score = 0;
            }
            p.role = PlayerRole::Guessing;
        }

        self.recalculate_ranks();

        if round_over && self.round == self.settings.rounds {
            self.state = LobbyStateKind::GameOver;
            self.drawer_idx = None;
            for p in self.players.iter().filter(|p| p.conn.connected) {
                effects.push(effect(
                    Recipient::Only(p.id.clone()),
                    Outbound::GameOver(Box::new(self.ready_view_for(Some(p.id.clone())))),
                ));
            }
            return effects;
        }

        if round_over {
            self.round += 1;
        }

        self.drawing.clear();
        self.drawer_idx = next_idx;
        if let Some(idx) = self.drawer_idx {
            self.players[idx].role = PlayerRole::Drawing;
        }
        self.state = LobbyStateKind::Ongoing;

        if self.drawer_idx.is_some() {
            self.word_choice = words::get_random_words(
                3,
                self.settings.language,
                self.settings.custom_words_chance,
                &mut self.custom_pool,
                rng,
            );
            self.round_end_ms = now_ms + self.settings.drawing_time as i64 * 1000;
        }

        effects.push(effect(
            Recipient::AllMembers,
            Outbound::NextTurn { round: self.round, players: self.player_views(), round_end_relative_ms: self.round_end_ms - now_ms },
        ));
        if let Some(idx) = self.drawer_idx {
            effects.push(effect(Recipient::Only(self.players[idx].id.clone()), Outbound::YourTurn(self.word_choice.clone())));
        }

        effects
    }

    // -- Settings editing ---------------------------------------------------

    /// Applies an owner-issued settings edit (§6.2). Bound violations reply
    /// privately with a `system-message` and change nothing. Outside
    /// `Ongoing` every field, including drawing-time, applies immediately;
    /// mid-turn a drawing-time change is staged as `pending_drawing_time`
    /// and only takes effect at the next `advance`.
    pub fn edit_settings(&mut self, sender: &UserId, edit: SettingsEdit, rng: &mut impl Rng) -> Vec<Effect> {
        let refuse = |msg: &str| vec![effect(Recipient::Only(sender.clone()), Outbound::SystemMessage(msg.to_string()))];

        if self.owner_id.as_ref() != Some(sender) {
            return refuse("only the lobby owner can edit settings");
        }
        if let Some(v) = edit.max_players
            && !(MIN_PLAYERS..=MAX_PLAYERS).contains(&v)
        {
            return refuse(&format!("max players must be between {MIN_PLAYERS} and {MAX_PLAYERS}"));
        }
        if let Some(v) = edit.rounds
            && !(MIN_ROUNDS..=MAX_ROUNDS).contains(&v)
        {
            return refuse(&format!("rounds must be between {MIN_ROUNDS} and {MAX_ROUNDS}"));
        }
        if let Some(v) = edit.drawing_time
            && !(MIN_DRAWING_TIME..=MAX_DRAWING_TIME).contains(&v)
        {
            return refuse(&format!("drawing time must be between {MIN_DRAWING_TIME} and {MAX_DRAWING_TIME} seconds"));
        }
        if let Some(v) = edit.custom_words_chance
            && v > 100
        {
            return refuse("custom words chance must be between 0 and 100");
        }

        if let Some(v) = edit.max_players {
            self.settings.max_players = v;
        }
        if let Some(v) = edit.rounds {
            self.settings.rounds = v;
        }
        if let Some(v) = edit.public {
            self.settings.public = v;
        }
        if let Some(v) = edit.custom_words_chance {
            self.settings.custom_words_chance = v;
        }
        if let Some(v) = edit.language {
            self.settings.language = v;
        }
        if let Some(words) = edit.custom_words {
            self.custom_pool = CustomWordPool::new(words, rng);
        }
        if let Some(v) = edit.followers_only {
            self.access.followers_only = v;
        }
        if let Some(v) = edit.subscribers_only {
            self.access.subscribers_only = v;
        }
        if let Some(v) = edit.drawing_time {
            if self.state == LobbyStateKind::Ongoing {
                self.pending_drawing_time = Some(v);
            } else {
                self.settings.drawing_time = v;
            }
        }

        vec![effect(Recipient::AllMembers, Outbound::LobbySettingsChanged(self.settings.clone()))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn lobby_with_players(n: usize) -> (LobbyState, Vec<UserId>) {
        let mut rng = rng();
        let mut state = LobbyState::new(EditableSettings::default(), AccessPolicy::default(), Vec::new(), &mut rng);
        let mut ids = Vec::new();
        for i in 0..n {
            let id: UserId = Arc::from(format!("p{i}"));
            state.admit_player(id.clone(), format!("Player {i}"), false);
            state.find_player_mut(&id).unwrap().conn.connected = true;
            ids.push(id);
        }
        (state, ids)
    }

    #[test]
    fn choose_word_sends_guesser_view_to_guessers_and_observers_only() {
        let (mut state, ids) = lobby_with_players(2);
        state.start(0, &mut rng());
        let drawer = ids.iter().find(|id| state.is_current_drawer(id)).cloned().unwrap();

        let effects = state.choose_word(&drawer, 0);
        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0].to, Recipient::GuessersAndObservers));
        assert!(matches!(effects[0].message, Outbound::UpdateWordHint(_)));
        assert!(matches!(effects[1].to, Recipient::DrawerAndStandby));

        // The guesser-view effect must not reveal the word; the drawer view must.
        let Outbound::UpdateWordHint(guesser_view) = &effects[0].message else { unreachable!() };
        assert!(guesser_view.iter().any(|h| h.character.is_none()));
        let Outbound::UpdateWordHint(drawer_view) = &effects[1].message else { unreachable!() };
        assert!(drawer_view.iter().all(|h| h.character.is_some()));
    }

    #[test]
    fn choose_word_invalid_index_replies_with_system_message() {
        let (mut state, ids) = lobby_with_players(2);
        state.start(0, &mut rng());
        let drawer = ids.iter().find(|id| state.is_current_drawer(id)).cloned().unwrap();

        let effects = state.choose_word(&drawer, 99);
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0].to, Recipient::Only(ref id) if *id == drawer));
        assert!(matches!(effects[0].message, Outbound::SystemMessage(_)));
    }

    #[test]
    fn edit_settings_rejects_non_owner() {
        let (mut state, ids) = lobby_with_players(2);
        let non_owner = ids[1].clone();
        let edit = SettingsEdit { rounds: Some(5), ..Default::default() };
        let effects = state.edit_settings(&non_owner, edit, &mut rng());
        assert!(matches!(effects[0].message, Outbound::SystemMessage(_)));
        assert_eq!(state.settings.rounds, EditableSettings::default().rounds);
    }

    #[test]
    fn edit_settings_rejects_out_of_bounds_values() {
        let (mut state, ids) = lobby_with_players(2);
        let owner = ids[0].clone();
        let edit = SettingsEdit { max_players: Some(1), ..Default::default() };
        let effects = state.edit_settings(&owner, edit, &mut rng());
        assert!(matches!(effects[0].message, Outbound::SystemMessage(_)));
        assert_eq!(state.settings.max_players, EditableSettings::default().max_players);
    }

    #[test]
    fn edit_settings_applies_immediately_outside_ongoing() {
        let (mut state, ids) = lobby_with_players(2);
        let owner = ids[0].clone();
        let edit = SettingsEdit { rounds: Some(7), drawing_time: Some(90), ..Default::default() };
        let effects = state.edit_settings(&owner, edit, &mut rng());
        assert_eq!(state.settings.rounds, 7);
        assert_eq!(state.settings.drawing_time, 90);
        assert!(state.pending_drawing_time.is_none());
        assert!(matches!(effects[0].to, Recipient::AllMembers));
        assert!(matches!(effects[0].message, Outbound::LobbySettingsChanged(_)));
    }

    #[test]
    fn edit_settings_stages_drawing_time_mid_turn() {
        let (mut state, ids) = lobby_with_players(2);
        let owner = ids[0].clone();
        state.start(0, &mut rng());
        assert_eq!(state.state, LobbyStateKind::Ongoing);

        let edit = SettingsEdit { drawing_time: Some(200), ..Default::default() };
        state.edit_settings(&owner, edit, &mut rng());
        assert_eq!(state.pending_drawing_time, Some(200));
        assert_ne!(state.settings.drawing_time, 200);
    }
}
