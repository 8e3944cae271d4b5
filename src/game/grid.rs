//! Arena grid geometry

use serde::{Deserialize, Serialize};

/// Width and height of the square arena, in cells
pub const GRID_SIZE: i32 = 40;

/// A single cell on the arena grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell shifted by the given delta
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// True when both cells share one axis and are exactly one unit apart on the other
    pub fn is_adjacent(self, other: Cell) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }
}

/// Check if a cell lies inside the arena
pub fn is_valid_cell(cell: Cell) -> bool {
    (0..GRID_SIZE).contains(&cell.x) && (0..GRID_SIZE).contains(&cell.y)
}
