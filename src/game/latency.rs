//! Best-effort latency estimates per (player, match)

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use super::r#match::{MatchId, PlayerId};

/// Last ping observed for one player in one match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyRecord {
    /// Client clock at send time, unix seconds
    pub client_time: f64,
    /// Server clock at receipt, unix seconds
    pub server_time: f64,
    pub latency_ms: i64,
    /// Monotonic receipt time, used for expiry
    pub recorded_at: Instant,
}

/// Half the client-to-server clock gap, in milliseconds.
///
/// A non-positive client timestamp yields 0. Clock skew can make the result negative.
pub fn estimate_latency_ms(server_time: f64, client_time: f64) -> i64 {
    if client_time > 0.0 {
        ((server_time - client_time) * 500.0).round() as i64
    } else {
        0
    }
}

/// Latency records, independent of match lifecycle
pub struct LatencyTracker {
    records: DashMap<(PlayerId, MatchId), LatencyRecord>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Store a ping, replacing any earlier one for the same pair
    pub fn record(
        &self,
        player_id: PlayerId,
        match_id: MatchId,
        client_time: f64,
        server_time: f64,
        now: Instant,
    ) -> LatencyRecord {
        let record = LatencyRecord {
            client_time,
            server_time,
            latency_ms: estimate_latency_ms(server_time, client_time),
            recorded_at: now,
        };
        self.records.insert((player_id, match_id), record);
        record
    }

    pub fn latest(&self, player_id: &PlayerId, match_id: &MatchId) -> Option<i64> {
        self.records
            .get(&(player_id.clone(), match_id.clone()))
            .map(|r| r.latency_ms)
    }

    /// Forget every record for an evicted match
    pub fn purge_match(&self, match_id: &MatchId) {
        self.records.retain(|(_, mid), _| mid != match_id);
    }

    /// Drop records not refreshed within `ttl`; returns how many were dropped
    pub fn purge_stale(&self, ttl: Duration, now: Instant) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| now.saturating_duration_since(record.recorded_at) <= ttl);
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_clocks_give_zero_latency() {
        assert_eq!(estimate_latency_ms(1_700_000_000.25, 1_700_000_000.25), 0);
    }

    #[test]
    fn estimate_halves_the_gap() {
        // 80 ms gap -> 40 ms estimate
        assert_eq!(estimate_latency_ms(100.080, 100.0), 40);
    }

    #[test]
    fn missing_client_timestamp_gives_zero() {
        assert_eq!(estimate_latency_ms(100.0, 0.0), 0);
        assert_eq!(estimate_latency_ms(100.0, -5.0), 0);
    }

    #[test]
    fn newer_ping_overwrites_older_one() {
        let tracker = LatencyTracker::new();
        let player = PlayerId::new("p1");
        let game = MatchId::generate();

        tracker.record(player.clone(), game.clone(), 10.0, 10.2, Instant::now());
        tracker.record(player.clone(), game.clone(), 20.0, 20.02, Instant::now());

        assert_eq!(tracker.latest(&player, &game), Some(10));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn records_are_scoped_per_match() {
        let tracker = LatencyTracker::new();
        let player = PlayerId::new("p1");
        let first = MatchId::generate();
        let second = MatchId::generate();

        tracker.record(player.clone(), first.clone(), 10.0, 10.1, Instant::now());
        assert_eq!(tracker.latest(&player, &second), None);

        tracker.record(player.clone(), second.clone(), 10.0, 10.1, Instant::now());
        tracker.purge_match(&first);
        assert_eq!(tracker.latest(&player, &first), None);
        assert_eq!(tracker.latest(&player, &second), Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_records_expire_even_without_a_match() {
        let tracker = LatencyTracker::new();
        let ttl = Duration::from_secs(60);
        for i in 0..100 {
            tracker.record(PlayerId::new(format!("p{i}")), MatchId::generate(), 1.0, 1.0, Instant::now());
        }

        tokio::time::advance(Duration::from_secs(30)).await;
        let fresh = PlayerId::new("fresh");
        let game = MatchId::generate();
        tracker.record(fresh.clone(), game.clone(), 1.0, 1.0, Instant::now());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(tracker.purge_stale(ttl, Instant::now()), 100);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.latest(&fresh, &game), Some(0));
    }
}
