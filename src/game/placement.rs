//! Random placement of snakes and fruits

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::grid::{is_valid_cell, Cell, GRID_SIZE};
use super::snake::Snake;

/// Inclusive head range on each axis; keeps the second body cell in bounds
pub const SPAWN_MIN: i32 = 5;
pub const SPAWN_MAX: i32 = 34;

/// Give up on fruit placement after this many draws
pub const MAX_FRUIT_ATTEMPTS: usize = 100;

/// Cosmetic fruit variety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FruitKind {
    Apple,
    Banana,
    Cherry,
}

impl FruitKind {
    pub const ALL: [FruitKind; 3] = [FruitKind::Apple, FruitKind::Banana, FruitKind::Cherry];
}

/// A consumable fruit on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fruit {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: FruitKind,
}

impl Fruit {
    pub fn new(cell: Cell, kind: FruitKind) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
            kind,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// Spawn a two-cell snake disjoint from `exclude`.
///
/// Redraws until a placement fits. Callers only exclude a handful of cells, so the
/// interior always has room.
pub fn spawn_snake<R: Rng + ?Sized>(rng: &mut R, exclude: &HashSet<Cell>) -> Snake {
    loop {
        let head = Cell::new(
            rng.gen_range(SPAWN_MIN..=SPAWN_MAX),
            rng.gen_range(SPAWN_MIN..=SPAWN_MAX),
        );
        let dir = *Direction::ALL.choose(rng).unwrap_or(&Direction::Up);
        let (dx, dy) = dir.delta();
        let tail = head.offset(-dx, -dy);

        let fits = [head, tail]
            .iter()
            .all(|c| is_valid_cell(*c) && !exclude.contains(c));
        if fits {
            if let Some(snake) = Snake::from_cells([head, tail]) {
                return snake;
            }
        }
    }
}

/// Draw up to `count` fruits on free cells.
///
/// Best effort: stops after [`MAX_FRUIT_ATTEMPTS`] draws and may return fewer.
pub fn spawn_fruits<R: Rng + ?Sized>(
    rng: &mut R,
    exclude: &HashSet<Cell>,
    count: usize,
) -> Vec<Fruit> {
    let mut fruits: Vec<Fruit> = Vec::with_capacity(count);
    let mut attempts = 0;

    while fruits.len() < count && attempts < MAX_FRUIT_ATTEMPTS {
        attempts += 1;
        let cell = Cell::new(rng.gen_range(0..GRID_SIZE), rng.gen_range(0..GRID_SIZE));
        if exclude.contains(&cell) || fruits.iter().any(|f| f.cell() == cell) {
            continue;
        }
        let kind = *FruitKind::ALL.choose(rng).unwrap_or(&FruitKind::Apple);
        fruits.push(Fruit::new(cell, kind));
    }

    fruits
}
