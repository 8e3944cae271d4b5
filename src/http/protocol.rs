//! Wire types for the game HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::direction::Direction;
use crate::game::placement::Fruit;
use crate::game::snake::Snake;
use crate::game::{MatchId, MatchStatus, PlayerId, Slot};

/// Flat request parameters shared by the query-string and JSON forms
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionParams {
    pub action: Option<String>,
    pub match_id: Option<String>,
    pub color: Option<String>,
    pub direction: Option<String>,
    /// Client clock, unix seconds
    pub client_timestamp: Option<f64>,
}

/// A validated request for the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    CreateMatch {
        color: String,
    },
    JoinMatch {
        match_id: MatchId,
        color: String,
    },
    ListOpenMatches,
    GetState {
        match_id: MatchId,
    },
    SetDirection {
        match_id: MatchId,
        direction: Direction,
    },
    Ping {
        match_id: MatchId,
        client_timestamp: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMatchResponse {
    pub match_id: MatchId,
    pub player_slot: Slot,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinMatchResponse {
    pub match_id: MatchId,
    pub player_slot: Slot,
}

/// Lobby entry for a match waiting on an opponent
#[derive(Debug, Clone, Serialize)]
pub struct OpenMatch {
    pub match_id: MatchId,
    pub player1_name: String,
    pub player1_color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetDirectionResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PingResponse {
    pub server_time: f64,
    pub estimated_latency_ms: i64,
}

/// One player's slot as rendered to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub name: String,
    pub color: String,
    pub snake: Snake,
    pub direction: Option<Direction>,
    pub score: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayersView {
    #[serde(rename = "1")]
    pub player1: PlayerView,
    #[serde(rename = "2")]
    pub player2: Option<PlayerView>,
}

/// Latest latency estimates, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyView {
    pub own: Option<i64>,
    pub opponent: Option<i64>,
    pub player1: Option<i64>,
    pub player2: Option<i64>,
}

/// Full match state returned to a polling client
#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub status: MatchStatus,
    /// Viewer's slot, or null for spectators
    pub player_slot: Option<Slot>,
    pub players: PlayersView,
    pub fruits: Vec<Fruit>,
    pub winner: Option<PlayerId>,
    /// Unix seconds
    pub server_time: f64,
    pub latency: LatencyView,
}

/// Any successful dispatcher response
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActionResponse {
    Created(CreateMatchResponse),
    Joined(JoinMatchResponse),
    OpenMatches(Vec<OpenMatch>),
    State(Box<MatchView>),
    Direction(SetDirectionResponse),
    Pong(PingResponse),
}
