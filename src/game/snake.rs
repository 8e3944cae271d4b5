//! Snake body representation

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::grid::{is_valid_cell, Cell};

/// Ordered snake body, head first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snake {
    body: VecDeque<Cell>,
}

impl Snake {
    /// Build a snake from cells ordered head first. Returns `None` for an empty body.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Option<Self> {
        let body: VecDeque<Cell> = cells.into_iter().collect();
        if body.is_empty() {
            None
        } else {
            Some(Self { body })
        }
    }

    pub fn head(&self) -> Cell {
        // Bodies are never empty
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Score shown to players: body length minus one
    pub fn score(&self) -> usize {
        self.body.len().saturating_sub(1)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.body.iter().copied()
    }

    /// Push a new head; the tail is dropped unless the snake grows
    pub(crate) fn advance(&mut self, new_head: Cell, grow: bool) {
        self.body.push_front(new_head);
        if !grow {
            self.body.pop_back();
        }
    }

    /// In bounds with each cell one step from the previous one
    pub fn is_well_formed(&self) -> bool {
        self.body.iter().all(|c| is_valid_cell(*c))
            && self
                .body
                .iter()
                .zip(self.body.iter().skip(1))
                .all(|(a, b)| a.is_adjacent(*b))
    }
}
