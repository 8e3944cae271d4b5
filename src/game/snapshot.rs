//! Read views of match state

use crate::http::protocol::{LatencyView, MatchView, OpenMatch, PlayerView, PlayersView};

use super::latency::LatencyTracker;
use super::r#match::{MatchState, PlayerId, PlayerState, Slot};

/// Builds client-facing views from authoritative match state
pub struct SnapshotBuilder<'a> {
    latency: &'a LatencyTracker,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(latency: &'a LatencyTracker) -> Self {
        Self { latency }
    }

    /// Render `state` as seen by `viewer`
    pub fn build(&self, state: &MatchState, viewer: &PlayerId, server_time: f64) -> MatchView {
        let player_slot = state.slot_of(viewer);

        let latency_p1 = self.latency.latest(&state.player1.id, &state.id);
        let latency_p2 = state
            .player2
            .as_ref()
            .and_then(|p| self.latency.latest(&p.id, &state.id));
        let (own, opponent) = match player_slot {
            Some(Slot::One) => (latency_p1, latency_p2),
            Some(Slot::Two) => (latency_p2, latency_p1),
            None => (None, None),
        };

        MatchView {
            status: state.status,
            player_slot,
            players: PlayersView {
                player1: player_view(&state.player1),
                player2: state.player(Slot::Two).map(player_view),
            },
            fruits: state.fruits.clone(),
            winner: state.winner.clone(),
            server_time,
            latency: LatencyView {
                own,
                opponent,
                player1: latency_p1,
                player2: latency_p2,
            },
        }
    }
}

fn player_view(player: &PlayerState) -> PlayerView {
    PlayerView {
        name: player.name.clone(),
        color: player.color.clone(),
        snake: player.snake.clone(),
        direction: player.intent.current,
        score: player.snake.score(),
    }
}

/// Lobby summary of a waiting match
pub fn open_match(state: &MatchState) -> OpenMatch {
    OpenMatch {
        match_id: state.id.clone(),
        player1_name: state.player1.name.clone(),
        player1_color: state.player1.color.clone(),
        created_at: state.created_at,
    }
}
