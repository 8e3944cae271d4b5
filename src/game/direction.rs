//! Direction intent queue
//!
//! Each snake carries a `current` direction (applied on the next movement) and a
//! pending `next` request. Reversals are checked against `current` only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GameError;

/// The four cardinal directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit vector (dx, dy); y grows downwards
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(GameError::InvalidDirection(other.to_string())),
        }
    }
}

/// Resolve the direction to apply this tick from the current/next pair
pub fn resolve(current: Option<Direction>, next: Option<Direction>) -> Option<Direction> {
    match (current, next) {
        (None, next) => next,
        (current, None) => current,
        (Some(current), Some(next)) if next == current.opposite() => Some(current),
        (_, next) => next,
    }
}

/// Outcome of a direction change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionRequest {
    Accepted,
    /// The request reversed the active direction and was dropped
    Ignored,
}

/// Per-snake current/next direction pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionIntent {
    pub current: Option<Direction>,
    pub next: Option<Direction>,
}

impl DirectionIntent {
    /// Queue a direction change.
    ///
    /// The first request arms both slots so movement starts on the following tick.
    /// A request for the exact opposite of `current` is ignored; a pending `next`
    /// does not affect the check.
    pub fn request(&mut self, requested: Direction) -> DirectionRequest {
        match self.current {
            None => {
                self.current = Some(requested);
                self.next = Some(requested);
                DirectionRequest::Accepted
            }
            Some(current) if requested == current.opposite() => DirectionRequest::Ignored,
            Some(_) => {
                self.next = Some(requested);
                DirectionRequest::Accepted
            }
        }
    }

    /// Direction that will be applied on the next tick
    pub fn resolved(&self) -> Option<Direction> {
        resolve(self.current, self.next)
    }

    /// Promote the resolved direction to `current` once a tick has been applied
    pub fn commit(&mut self, resolved: Option<Direction>) {
        self.current = resolved;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_pairs_are_symmetric() {
        for dir in Direction::ALL {
            assert_ne!(dir, dir.opposite());
            assert_eq!(dir, dir.opposite().opposite());
        }
    }

    #[test]
    fn resolve_keeps_current_on_reversal() {
        for dir in Direction::ALL {
            assert_eq!(resolve(Some(dir), Some(dir.opposite())), Some(dir));
        }
    }

    #[test]
    fn resolve_handles_unset_slots() {
        assert_eq!(resolve(None, None), None);
        assert_eq!(resolve(None, Some(Direction::Left)), Some(Direction::Left));
        assert_eq!(resolve(Some(Direction::Up), None), Some(Direction::Up));
    }

    #[test]
    fn resolve_applies_perpendicular_turn() {
        assert_eq!(
            resolve(Some(Direction::Up), Some(Direction::Right)),
            Some(Direction::Right)
        );
    }

    #[test]
    fn first_request_arms_both_slots() {
        let mut intent = DirectionIntent::default();
        assert_eq!(intent.request(Direction::Up), DirectionRequest::Accepted);
        assert_eq!(intent.current, Some(Direction::Up));
        assert_eq!(intent.next, Some(Direction::Up));
    }

    #[test]
    fn reversal_of_current_is_ignored() {
        let mut intent = DirectionIntent::default();
        intent.request(Direction::Up);
        assert_eq!(intent.request(Direction::Down), DirectionRequest::Ignored);
        assert_eq!(intent.next, Some(Direction::Up));
    }

    #[test]
    fn reversal_stays_blocked_while_turn_is_pending() {
        let mut intent = DirectionIntent::default();
        intent.request(Direction::Up);
        assert_eq!(intent.request(Direction::Left), DirectionRequest::Accepted);
        // Still checked against `current` (up), not the queued left
        assert_eq!(intent.request(Direction::Down), DirectionRequest::Ignored);
        assert_eq!(intent.request(Direction::Right), DirectionRequest::Accepted);
        assert_eq!(intent.resolved(), Some(Direction::Right));
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!("left".parse::<Direction>().ok(), Some(Direction::Left));
        assert!(matches!(
            "north".parse::<Direction>(),
            Err(GameError::InvalidDirection(_))
        ));
    }
}
