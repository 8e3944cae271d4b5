//! Per-player request rate limiting

use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::num::NonZeroU32;

use crate::game::PlayerId;

/// Rate limiter keyed by player identity
pub type PlayerLimiter = RateLimiter<PlayerId, DefaultKeyedStateStore<PlayerId>, DefaultClock>;

/// Create a keyed rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> PlayerLimiter {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    RateLimiter::keyed(quota)
}

/// Default request budget per player; clients poll at 5/s and ping every 2s
pub const PLAYER_REQUEST_RATE_LIMIT: u32 = 30;

/// One budget per authenticated player
pub struct PlayerRateLimiter {
    limiter: PlayerLimiter,
}

impl PlayerRateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            limiter: create_limiter(requests_per_second),
        }
    }

    /// Check if a request is allowed (returns true if allowed)
    pub fn check(&self, player_id: &PlayerId) -> bool {
        self.limiter.check_key(player_id).is_ok()
    }

    /// Forget players whose budget has fully refilled; returns how many were dropped
    pub fn prune(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        before.saturating_sub(self.limiter.len())
    }

    /// Number of players currently tracked
    pub fn len(&self) -> usize {
        self.limiter.len()
    }
}

impl Default for PlayerRateLimiter {
    fn default() -> Self {
        Self::new(PLAYER_REQUEST_RATE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn burst_over_quota_is_rejected() {
        let limiter = PlayerRateLimiter::new(2);
        let player = PlayerId::new("p1");
        assert!(limiter.check(&player));
        assert!(limiter.check(&player));
        assert!(!limiter.check(&player));
    }

    #[test]
    fn players_have_separate_budgets() {
        let limiter = PlayerRateLimiter::new(1);
        assert!(limiter.check(&PlayerId::new("p1")));
        assert!(!limiter.check(&PlayerId::new("p1")));
        assert!(limiter.check(&PlayerId::new("p2")));
    }

    #[test]
    fn prune_forgets_idle_players() {
        let limiter = PlayerRateLimiter::new(1000);
        for i in 0..50 {
            assert!(limiter.check(&PlayerId::new(format!("p{i}"))));
        }
        assert_eq!(limiter.len(), 50);

        // 1000/s refills a single spent cell in 1ms
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(limiter.prune(), 50);
        assert_eq!(limiter.len(), 0);
    }

    #[test]
    fn prune_keeps_players_with_spent_budget() {
        let limiter = PlayerRateLimiter::new(1);
        let player = PlayerId::new("busy");
        assert!(limiter.check(&player));
        assert!(!limiter.check(&player));

        assert_eq!(limiter.prune(), 0);
        assert!(!limiter.check(&player));
    }
}
