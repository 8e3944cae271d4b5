//! Game simulation modules

pub mod direction;
pub mod grid;
pub mod latency;
pub mod r#match;
pub mod physics;
pub mod placement;
pub mod snake;
pub mod snapshot;
pub mod tick;

pub use direction::{Direction, DirectionRequest};
pub use latency::LatencyTracker;
pub use r#match::{MatchHandle, MatchId, MatchRegistry, MatchState, MatchStatus, PlayerId, PlayerProfile, Slot};

/// Errors raised by match operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Match not found")]
    NotFound,

    #[error("Match is full")]
    Full,

    #[error("Already seated in this match")]
    AlreadySeated,

    #[error("Match is not in progress")]
    NotInProgress,

    #[error("Not a player in this match")]
    NotAParticipant,

    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Cannot move match from {from} to {to}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },
}

impl GameError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound => "not_found",
            GameError::Full => "full",
            GameError::AlreadySeated => "already_seated",
            GameError::NotInProgress => "not_in_progress",
            GameError::NotAParticipant => "not_a_participant",
            GameError::InvalidDirection(_) => "invalid_direction",
            GameError::InvalidAction(_) => "invalid_action",
            GameError::InvalidRequest(_) => "invalid_request",
            GameError::InvalidTransition { .. } => "invalid_transition",
        }
    }
}
