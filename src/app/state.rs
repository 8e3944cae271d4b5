//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{LatencyTracker, MatchRegistry};
use crate::lobby::LobbyService;
use crate::util::rate_limit::PlayerRateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lobby: Arc<LobbyService>,
    pub rate_limiter: Arc<PlayerRateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Match and latency stores live only in memory for the process lifetime
        let match_registry = Arc::new(MatchRegistry::new());
        let latency = Arc::new(LatencyTracker::new());

        let lobby = Arc::new(LobbyService::new(
            match_registry,
            latency,
            config.tick_interval,
        ));

        let rate_limiter = Arc::new(PlayerRateLimiter::new(config.requests_per_second));

        Self {
            config,
            lobby,
            rate_limiter,
        }
    }
}
