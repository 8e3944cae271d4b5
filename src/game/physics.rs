//! Snake movement and collision resolution

use super::direction::Direction;
use super::grid::is_valid_cell;
use super::placement::Fruit;
use super::snake::Snake;

/// Result of moving one snake by one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// The moved snake, or the original one when the move collided
    pub snake: Snake,
    pub collision: bool,
    pub ate: bool,
}

/// Physics system for advancing snakes on the grid
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance `snake` one cell in `direction`.
    ///
    /// A fruit on the target cell is consumed even when the move then collides.
    /// Only walls and the opponent's body are obstacles; a snake may cross itself.
    pub fn step(
        snake: &Snake,
        direction: Direction,
        fruits: &mut Vec<Fruit>,
        opponent: Option<&Snake>,
    ) -> StepOutcome {
        let (dx, dy) = direction.delta();
        let new_head = snake.head().offset(dx, dy);

        let before = fruits.len();
        fruits.retain(|f| f.cell() != new_head);
        let ate = fruits.len() < before;

        let blocked = !is_valid_cell(new_head)
            || opponent.map_or(false, |other| other.contains(new_head));
        if blocked {
            return StepOutcome {
                snake: snake.clone(),
                collision: true,
                ate,
            };
        }

        let mut moved = snake.clone();
        moved.advance(new_head, ate);
        debug_assert!(moved.is_well_formed());
        StepOutcome {
            snake: moved,
            collision: false,
            ate,
        }
    }
}
