//! Lobby service - the single entry point for match lifecycle operations
//!
//! Every operation on an existing match holds that match's lock for its whole
//! read-modify-write, so at most one tick is applied per interval and direction
//! changes never interleave with a tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::game::snapshot::{open_match, SnapshotBuilder};
use crate::game::tick::tick_if_due;
use crate::game::{
    Direction, DirectionRequest, GameError, LatencyTracker, MatchHandle, MatchId, MatchRegistry,
    MatchState, PlayerId, PlayerProfile, Slot,
};
use crate::http::protocol::{MatchView, OpenMatch, PingResponse};
use crate::util::time::unix_secs_f64;

/// Lobby service
pub struct LobbyService {
    registry: Arc<MatchRegistry>,
    latency: Arc<LatencyTracker>,
    tick_interval: Duration,
}

impl LobbyService {
    pub fn new(registry: Arc<MatchRegistry>, latency: Arc<LatencyTracker>, tick_interval: Duration) -> Self {
        Self {
            registry,
            latency,
            tick_interval,
        }
    }

    fn handle(&self, match_id: &MatchId) -> Result<MatchHandle, GameError> {
        self.registry.get(match_id).ok_or(GameError::NotFound)
    }

    /// Open a new match with the caller in slot 1
    pub fn create_match(&self, host: PlayerProfile) -> (MatchId, Slot) {
        let match_id = MatchId::generate();
        let host_id = host.id.clone();
        let state = MatchState::new(match_id.clone(), host, &mut rand::thread_rng(), Instant::now());
        self.registry.insert(state);

        info!(match_id = %match_id, player_id = %host_id, "Created new match");
        (match_id, Slot::One)
    }

    /// Seat the caller in slot 2 and start the match
    pub fn join_match(&self, match_id: &MatchId, guest: PlayerProfile) -> Result<Slot, GameError> {
        let handle = self.handle(match_id)?;
        let mut state = handle.lock();
        let guest_id = guest.id.clone();

        state
            .join(guest, &mut rand::thread_rng(), Instant::now())
            .map_err(|e| {
                warn!(match_id = %match_id, player_id = %guest_id, error = %e, "Join rejected");
                e
            })?;
        Ok(Slot::Two)
    }

    pub fn list_open(&self) -> Vec<OpenMatch> {
        self.registry.open_matches().iter().map(open_match).collect()
    }

    /// Load a match, apply a tick if one is due, and render it for `viewer`
    pub fn get_state(&self, match_id: &MatchId, viewer: &PlayerId) -> Result<MatchView, GameError> {
        let handle = self.handle(match_id)?;
        let mut state = handle.lock();
        let now = Instant::now();

        // A seated player polling keeps the match alive, even while it waits for an opponent
        if state.slot_of(viewer).is_some() {
            state.last_activity = now;
        }

        let outcome = tick_if_due(&mut state, &mut rand::thread_rng(), now, self.tick_interval);
        if let Some(winner) = outcome.and_then(|o| o.winner) {
            info!(match_id = %match_id, winner = %winner, "Match finished");
        }

        Ok(SnapshotBuilder::new(&self.latency).build(&state, viewer, unix_secs_f64()))
    }

    /// Queue a direction change; returns false when a reversal was ignored
    pub fn set_direction(
        &self,
        match_id: &MatchId,
        player_id: &PlayerId,
        direction: Direction,
    ) -> Result<bool, GameError> {
        let handle = self.handle(match_id)?;
        let mut state = handle.lock();

        let outcome = state.request_direction(player_id, direction, Instant::now())?;
        debug!(
            match_id = %match_id,
            player_id = %player_id,
            direction = %direction,
            accepted = outcome == DirectionRequest::Accepted,
            "Direction requested"
        );
        Ok(outcome == DirectionRequest::Accepted)
    }

    /// Record a latency ping. Does not touch match state and never fails.
    pub fn ping(&self, match_id: &MatchId, player_id: &PlayerId, client_timestamp: f64) -> PingResponse {
        let server_time = unix_secs_f64();
        let record = self.latency.record(
            player_id.clone(),
            match_id.clone(),
            client_timestamp,
            server_time,
            Instant::now(),
        );
        debug!(
            match_id = %match_id,
            player_id = %player_id,
            client_time = record.client_time,
            server_time = record.server_time,
            latency_ms = record.latency_ms,
            "Ping recorded"
        );

        PingResponse {
            server_time,
            estimated_latency_ms: record.latency_ms,
        }
    }

    /// Evict idle matches, their latency records, and any ping older than `idle_ttl`
    pub fn sweep(&self, idle_ttl: Duration) -> usize {
        let now = Instant::now();
        let evicted = self.registry.sweep(idle_ttl, now);
        for match_id in &evicted {
            self.latency.purge_match(match_id);
            info!(match_id = %match_id, "Evicted idle match");
        }

        let stale_pings = self.latency.purge_stale(idle_ttl, now);
        if !evicted.is_empty() || stale_pings > 0 {
            debug!(
                stale_pings,
                latency_records = self.latency.len(),
                "Latency records after sweep"
            );
        }
        evicted.len()
    }

    pub fn active_matches(&self) -> usize {
        self.registry.active_matches()
    }

    pub fn open_matches(&self) -> usize {
        self.registry.open_matches().len()
    }
}
