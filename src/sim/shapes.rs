//! Tetromino shape library
//!
//! Shapes are small boolean grids (rows x cols). Spawners pick one of the
//! seven canonical tetrominoes and apply 0-3 quarter turns.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A block silhouette: `cells[row][col]` is filled when true
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    cells: Vec<Vec<bool>>,
}

impl Shape {
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            cells: rows
                .iter()
                .map(|row| row.iter().map(|&c| c != 0).collect())
                .collect(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Filled cells as (row, col)
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(c, _)| (r, c))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.filled_cells().count()
    }
}

/// The seven tetrominoes: I, O, T, S, Z, J, L
pub const TETROMINOES: [&[&[u8]]; 7] = [
    &[&[1, 1, 1, 1]],
    &[&[1, 1], &[1, 1]],
    &[&[0, 1, 0], &[1, 1, 1]],
    &[&[0, 1, 1], &[1, 1, 0]],
    &[&[1, 1, 0], &[0, 1, 1]],
    &[&[1, 0, 0], &[1, 1, 1]],
    &[&[0, 0, 1], &[1, 1, 1]],
];

/// Rotate a shape 90° clockwise (transpose, then reverse each row)
pub fn rotate90(shape: &Shape) -> Shape {
    let rows = shape.rows();
    let cols = shape.cols();
    let cells = (0..cols)
        .map(|c| (0..rows).rev().map(|r| shape.is_filled(r, c)).collect())
        .collect();
    Shape { cells }
}

/// Pick a tetromino with a uniformly random orientation
pub fn random_shape<R: Rng + ?Sized>(rng: &mut R) -> Shape {
    let mut shape = Shape::from_rows(TETROMINOES[rng.random_range(0..TETROMINOES.len())]);
    for _ in 0..rng.random_range(0..4) {
        shape = rotate90(&shape);
    }
    shape
}
