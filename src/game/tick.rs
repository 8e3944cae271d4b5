//! Tick orchestration
//!
//! A tick is applied by whichever request observes that the tick interval has
//! elapsed; callers must hold the match lock for the whole read-modify-write.
//!
//! Player 1 always moves first. If that move ends the match, player 2 does not
//! move during the same tick.

use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::debug;

use super::physics::PhysicsSystem;
use super::placement::{spawn_fruits, Fruit};
use super::r#match::{MatchState, MatchStatus, PlayerId, FRUIT_TARGET};

/// What a single tick changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub fruits_eaten: usize,
    pub fruits_spawned: usize,
    /// Set when this tick ended the match
    pub winner: Option<PlayerId>,
}

/// True when the match is running and a full interval has passed since the last tick
pub fn is_due(state: &MatchState, now: Instant, interval: Duration) -> bool {
    state.status == MatchStatus::Playing
        && now.saturating_duration_since(state.last_tick) >= interval
}

/// Apply one tick if one is due
pub fn tick_if_due<R: Rng + ?Sized>(
    state: &mut MatchState,
    rng: &mut R,
    now: Instant,
    interval: Duration,
) -> Option<TickOutcome> {
    if !is_due(state, now, interval) {
        return None;
    }
    Some(run_tick(state, rng, now))
}

/// Advance both snakes by one step, refill fruits and stamp the tick time
pub fn run_tick<R: Rng + ?Sized>(state: &mut MatchState, rng: &mut R, now: Instant) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    let mut winner: Option<PlayerId> = None;

    let p1_dir = state.player1.intent.resolved();
    let p2_dir = state.player2.as_ref().and_then(|p| p.intent.resolved());

    if let Some(dir) = p1_dir {
        let opponent = state.player2.as_ref().map(|p| &p.snake);
        let step = PhysicsSystem::step(&state.player1.snake, dir, &mut state.fruits, opponent);
        outcome.fruits_eaten += usize::from(step.ate);
        state.player1.snake = step.snake;

        if step.collision {
            winner = state.player2.as_ref().map(|p| p.id.clone());
        }
    }

    if winner.is_none() {
        if let (Some(p2), Some(dir)) = (state.player2.as_mut(), p2_dir) {
            let step = PhysicsSystem::step(&p2.snake, dir, &mut state.fruits, Some(&state.player1.snake));
            outcome.fruits_eaten += usize::from(step.ate);
            p2.snake = step.snake;

            if step.collision {
                winner = Some(state.player1.id.clone());
            }
        }
    }

    outcome.fruits_spawned = refill_fruits(state, rng);

    state.player1.intent.commit(p1_dir);
    if let Some(p2) = state.player2.as_mut() {
        p2.intent.commit(p2_dir);
    }

    if let Some(winner_id) = winner {
        // Playing -> Finished is always legal here
        if state.set_status(MatchStatus::Finished).is_ok() {
            state.winner = Some(winner_id.clone());
            outcome.winner = Some(winner_id);
        }
    }

    state.last_tick = now;
    state.last_activity = now;

    debug!(
        match_id = %state.id,
        eaten = outcome.fruits_eaten,
        spawned = outcome.fruits_spawned,
        finished = outcome.winner.is_some(),
        "Tick applied"
    );
    outcome
}

/// Top fruits back up to the target one at a time, stopping when placement fails
fn refill_fruits<R: Rng + ?Sized>(state: &mut MatchState, rng: &mut R) -> usize {
    let mut spawned = 0;
    while state.fruits.len() < FRUIT_TARGET {
        let mut exclude = state.occupied_cells();
        exclude.extend(state.fruits.iter().map(Fruit::cell));

        match spawn_fruits(rng, &exclude, 1).pop() {
            Some(fruit) => {
                state.fruits.push(fruit);
                spawned += 1;
            }
            None => break,
        }
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::direction::Direction;
    use crate::game::grid::Cell;
    use crate::game::placement::FruitKind;
    use crate::game::r#match::{MatchId, PlayerProfile};
    use crate::game::snake::Snake;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const INTERVAL: Duration = Duration::from_millis(500);

    fn snake(cells: &[(i32, i32)]) -> Snake {
        Snake::from_cells(cells.iter().map(|&(x, y)| Cell::new(x, y))).unwrap()
    }

    fn profile(id: &str) -> PlayerProfile {
        PlayerProfile {
            id: PlayerId::new(id),
            name: id.to_string(),
            color: "#123456".to_string(),
        }
    }

    /// Running match with fixed snakes and no fruits
    fn playing_match(rng: &mut ChaCha8Rng, p1: Snake, p2: Snake, start: Instant) -> MatchState {
        let mut state = MatchState::new(MatchId::generate(), profile("p1"), rng, start);
        state.join(profile("p2"), rng, start).unwrap();
        state.player1.snake = p1;
        state.player2.as_mut().unwrap().snake = p2;
        state.fruits.clear();
        state
    }

    #[test]
    fn not_due_before_interval_elapses() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let start = Instant::now();
        let mut state = playing_match(&mut rng, snake(&[(10, 10), (10, 11)]), snake(&[(30, 30), (30, 31)]), start);

        assert!(!is_due(&state, start + Duration::from_millis(499), INTERVAL));
        assert!(is_due(&state, start + INTERVAL, INTERVAL));
        assert!(tick_if_due(&mut state, &mut rng, start + Duration::from_millis(100), INTERVAL).is_none());
    }

    #[test]
    fn waiting_match_never_ticks() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let start = Instant::now();
        let state = MatchState::new(MatchId::generate(), profile("p1"), &mut rng, start);
        assert!(!is_due(&state, start + Duration::from_secs(10), INTERVAL));
    }

    #[test]
    fn idle_snakes_do_not_move() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let start = Instant::now();
        let p1 = snake(&[(10, 10), (10, 11)]);
        let p2 = snake(&[(30, 30), (30, 31)]);
        let mut state = playing_match(&mut rng, p1.clone(), p2.clone(), start);

        run_tick(&mut state, &mut rng, start + INTERVAL);

        assert_eq!(state.player1.snake, p1);
        assert_eq!(state.player2.as_ref().unwrap().snake, p2);
        assert_eq!(state.status, MatchStatus::Playing);
        assert_eq!(state.fruits.len(), FRUIT_TARGET);
        assert_eq!(state.last_tick, start + INTERVAL);
    }

    #[test]
    fn player_one_wall_hit_ends_match_before_player_two_moves() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let start = Instant::now();
        let p2 = snake(&[(30, 30), (30, 31)]);
        let mut state = playing_match(&mut rng, snake(&[(10, 0), (10, 1)]), p2.clone(), start);
        let p1_id = PlayerId::new("p1");
        let p2_id = PlayerId::new("p2");

        state.request_direction(&p1_id, Direction::Up, start).unwrap();
        state.request_direction(&p2_id, Direction::Left, start).unwrap();
        let outcome = run_tick(&mut state, &mut rng, start + INTERVAL);

        assert_eq!(state.status, MatchStatus::Finished);
        assert_eq!(state.winner, Some(p2_id.clone()));
        assert_eq!(outcome.winner, Some(p2_id));
        assert_eq!(state.player2.as_ref().unwrap().snake, p2);
    }

    #[test]
    fn player_two_collision_awards_player_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let start = Instant::now();
        let mut state = playing_match(
            &mut rng,
            snake(&[(10, 10), (11, 10)]),
            snake(&[(10, 12), (10, 13)]),
            start,
        );
        let p2_id = PlayerId::new("p2");

        // p2 moves up into (10, 11); p1 is idle
        state.request_direction(&p2_id, Direction::Up, start).unwrap();
        run_tick(&mut state, &mut rng, start + INTERVAL);
        assert_eq!(state.status, MatchStatus::Playing);

        // (10, 10) is p1's head
        run_tick(&mut state, &mut rng, start + INTERVAL * 2);
        assert_eq!(state.status, MatchStatus::Finished);
        assert_eq!(state.winner, Some(PlayerId::new("p1")));
    }

    #[test]
    fn player_two_collides_with_moved_player_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let start = Instant::now();
        let mut state = playing_match(
            &mut rng,
            snake(&[(10, 10), (9, 10)]),
            snake(&[(11, 12), (11, 13)]),
            start,
        );
        state.request_direction(&PlayerId::new("p1"), Direction::Right, start).unwrap();
        state.request_direction(&PlayerId::new("p2"), Direction::Up, start).unwrap();

        run_tick(&mut state, &mut rng, start + INTERVAL);
        assert_eq!(state.player1.snake.head(), Cell::new(11, 10));
        assert_eq!(state.player2.as_ref().unwrap().snake.head(), Cell::new(11, 11));

        // p2 now steps onto (11, 10), the second cell of p1's already-moved body
        run_tick(&mut state, &mut rng, start + INTERVAL * 2);
        assert_eq!(state.status, MatchStatus::Finished);
        assert_eq!(state.winner, Some(PlayerId::new("p1")));
    }

    #[test]
    fn eating_in_sequence_keeps_three_fruits() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let start = Instant::now();
        let mut state = playing_match(
            &mut rng,
            snake(&[(10, 10), (9, 10)]),
            snake(&[(30, 30), (30, 31)]),
            start,
        );
        state.fruits = vec![
            Fruit::new(Cell::new(11, 10), FruitKind::Apple),
            Fruit::new(Cell::new(12, 10), FruitKind::Banana),
            Fruit::new(Cell::new(0, 39), FruitKind::Cherry),
        ];
        state.request_direction(&PlayerId::new("p1"), Direction::Right, start).unwrap();

        let first = run_tick(&mut state, &mut rng, start + INTERVAL);
        assert_eq!(first.fruits_eaten, 1);
        assert_eq!(state.fruits.len(), FRUIT_TARGET);

        // The refill never lands on the snake, so the second fruit is still ahead
        let second = run_tick(&mut state, &mut rng, start + INTERVAL * 2);
        assert_eq!(second.fruits_eaten, 1);
        assert_eq!(state.fruits.len(), FRUIT_TARGET);
        assert_eq!(state.player1.snake.len(), 4);
        assert_eq!(state.player1.snake.score(), 3);

        let occupied = state.occupied_cells();
        assert!(state.fruits.iter().all(|f| !occupied.contains(&f.cell())));
    }

    #[test]
    fn resolved_direction_is_committed() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let start = Instant::now();
        let mut state = playing_match(
            &mut rng,
            snake(&[(10, 10), (10, 11)]),
            snake(&[(30, 30), (30, 31)]),
            start,
        );
        let p1_id = PlayerId::new("p1");

        state.request_direction(&p1_id, Direction::Up, start).unwrap();
        state.request_direction(&p1_id, Direction::Left, start).unwrap();
        run_tick(&mut state, &mut rng, start + INTERVAL);

        assert_eq!(state.player1.intent.current, Some(Direction::Left));
        assert_eq!(state.player1.snake.head(), Cell::new(9, 10));

        // After the commit, reversing `left` is blocked but `down` is fine
        assert_eq!(
            state.request_direction(&p1_id, Direction::Right, start),
            Ok(crate::game::DirectionRequest::Ignored)
        );
        assert_eq!(
            state.request_direction(&p1_id, Direction::Down, start),
            Ok(crate::game::DirectionRequest::Accepted)
        );
    }
}
