//! Match state, lifecycle and registry

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::direction::{Direction, DirectionIntent, DirectionRequest};
use super::grid::Cell;
use super::placement::{spawn_fruits, spawn_snake, Fruit};
use super::snake::Snake;
use super::GameError;

/// Number of live fruits the arena tries to keep
pub const FRUIT_TARGET: usize = 3;

/// Opaque, externally unguessable match identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse an id supplied by a client; anything but 32 lowercase hex chars is malformed
    pub fn parse(raw: &str) -> Result<Self, GameError> {
        let well_formed = raw.len() == 32
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(GameError::InvalidRequest("malformed match id".to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable player identity handed over by the auth layer. Never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Only player 1 seated
    Waiting,
    /// Both players seated, ticks are applied
    Playing,
    /// A collision ended the match; terminal
    Finished,
}

impl MatchStatus {
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Waiting, MatchStatus::Playing)
                | (MatchStatus::Playing, MatchStatus::Finished)
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Waiting => "waiting",
            MatchStatus::Playing => "playing",
            MatchStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Player slot within a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum Slot {
    One,
    Two,
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> u8 {
        match slot {
            Slot::One => 1,
            Slot::Two => 2,
        }
    }
}

/// Who is sitting down, as supplied by the caller
#[derive(Debug, Clone)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
}

/// Player state in a match (authoritative)
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub snake: Snake,
    pub intent: DirectionIntent,
}

impl PlayerState {
    fn seat(profile: PlayerProfile, snake: Snake) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            color: profile.color,
            snake,
            intent: DirectionIntent::default(),
        }
    }
}

/// Match state; the single source of truth for one game
#[derive(Debug, Clone)]
pub struct MatchState {
    pub id: MatchId,
    pub status: MatchStatus,
    pub player1: PlayerState,
    pub player2: Option<PlayerState>,
    pub fruits: Vec<Fruit>,
    /// Monotonic time of the last applied tick
    pub last_tick: Instant,
    /// Monotonic time of the last mutation, used for eviction
    pub last_activity: Instant,
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
}

impl MatchState {
    /// Open a new match with `host` in slot 1
    pub fn new<R: Rng + ?Sized>(id: MatchId, host: PlayerProfile, rng: &mut R, now: Instant) -> Self {
        let snake = spawn_snake(rng, &HashSet::new());
        let exclude: HashSet<Cell> = snake.cells().collect();
        let fruits = spawn_fruits(rng, &exclude, FRUIT_TARGET);

        Self {
            id,
            status: MatchStatus::Waiting,
            player1: PlayerState::seat(host, snake),
            player2: None,
            fruits,
            last_tick: now,
            last_activity: now,
            winner: None,
            created_at: Utc::now(),
        }
    }

    /// Seat a second player and start the match
    pub fn join<R: Rng + ?Sized>(
        &mut self,
        guest: PlayerProfile,
        rng: &mut R,
        now: Instant,
    ) -> Result<(), GameError> {
        if self.player1.id == guest.id {
            return Err(GameError::AlreadySeated);
        }
        if self.player2.is_some() || self.status != MatchStatus::Waiting {
            return Err(GameError::Full);
        }

        let mut exclude: HashSet<Cell> = self.player1.snake.cells().collect();
        exclude.extend(self.fruits.iter().map(Fruit::cell));
        let snake = spawn_snake(rng, &exclude);

        self.set_status(MatchStatus::Playing)?;
        self.player2 = Some(PlayerState::seat(guest, snake));
        self.player1.intent.clear();
        self.last_tick = now;
        self.last_activity = now;

        info!(
            match_id = %self.id,
            player1 = %self.player1.id,
            player2 = %self.player2.as_ref().map(|p| p.id.as_str()).unwrap_or_default(),
            "Match started"
        );
        Ok(())
    }

    /// The only place the lifecycle status changes
    pub(crate) fn set_status(&mut self, next: MatchStatus) -> Result<(), GameError> {
        if !self.status.can_transition_to(next) {
            return Err(GameError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn slot_of(&self, player_id: &PlayerId) -> Option<Slot> {
        if &self.player1.id == player_id {
            Some(Slot::One)
        } else if self.player2.as_ref().map_or(false, |p| &p.id == player_id) {
            Some(Slot::Two)
        } else {
            None
        }
    }

    pub fn player(&self, slot: Slot) -> Option<&PlayerState> {
        match slot {
            Slot::One => Some(&self.player1),
            Slot::Two => self.player2.as_ref(),
        }
    }

    fn player_mut(&mut self, slot: Slot) -> Option<&mut PlayerState> {
        match slot {
            Slot::One => Some(&mut self.player1),
            Slot::Two => self.player2.as_mut(),
        }
    }

    /// Queue a direction change for `player_id`
    pub fn request_direction(
        &mut self,
        player_id: &PlayerId,
        direction: Direction,
        now: Instant,
    ) -> Result<DirectionRequest, GameError> {
        if self.status != MatchStatus::Playing {
            return Err(GameError::NotInProgress);
        }
        let slot = self.slot_of(player_id).ok_or(GameError::NotAParticipant)?;
        let player = self.player_mut(slot).ok_or(GameError::NotAParticipant)?;

        let outcome = player.intent.request(direction);
        if outcome == DirectionRequest::Accepted {
            self.last_activity = now;
        }
        Ok(outcome)
    }

    /// Cells taken by either snake
    pub fn occupied_cells(&self) -> HashSet<Cell> {
        let mut cells: HashSet<Cell> = self.player1.snake.cells().collect();
        if let Some(p2) = &self.player2 {
            cells.extend(p2.snake.cells());
        }
        cells
    }
}

/// Shared handle to a match; the mutex serializes every read-modify-write
pub type MatchHandle = Arc<Mutex<MatchState>>;

/// Registry of all live matches
pub struct MatchRegistry {
    matches: DashMap<MatchId, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    pub fn get(&self, id: &MatchId) -> Option<MatchHandle> {
        self.matches.get(id).map(|m| m.value().clone())
    }

    pub fn insert(&self, state: MatchState) -> MatchHandle {
        let id = state.id.clone();
        let handle = Arc::new(Mutex::new(state));
        self.matches.insert(id, handle.clone());
        handle
    }

    pub fn remove(&self, id: &MatchId) -> Option<MatchHandle> {
        self.matches.remove(id).map(|(_, h)| h)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    /// Snapshot of the handles so no map shard is held while a match is locked
    fn handles(&self) -> Vec<(MatchId, MatchHandle)> {
        self.matches
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Matches still waiting for a second player, oldest first
    pub fn open_matches(&self) -> Vec<MatchState> {
        let mut open: Vec<MatchState> = self
            .handles()
            .into_iter()
            .filter_map(|(_, handle)| {
                let state = handle.lock();
                (state.status == MatchStatus::Waiting).then(|| state.clone())
            })
            .collect();
        open.sort_by_key(|m| m.created_at);
        open
    }

    /// Drop matches idle for longer than `idle_ttl`; returns the evicted ids
    pub fn sweep(&self, idle_ttl: Duration, now: Instant) -> Vec<MatchId> {
        let stale: Vec<MatchId> = self
            .handles()
            .into_iter()
            .filter(|(_, handle)| now.saturating_duration_since(handle.lock().last_activity) > idle_ttl)
            .map(|(id, _)| id)
            .collect();

        for id in &stale {
            self.remove(id);
        }
        stale
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
