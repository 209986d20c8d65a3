use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::Position;

/// A generic 2D grid of cells.
///
/// Stores elements of type `T` in a flat vector using row-major order. The
/// renderer uses it as a raster of who occupies each cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Creates a grid covering every cell a position on a board of `board_size` can snap to.
    ///
    /// Positions are clamped into `[0, board_size]`, so the grid is one cell
    /// wider and taller than the board.
    pub fn covering(board_size: usize) -> Self
    where
        T: Default + Clone,
    {
        Self::new(board_size + 1, board_size + 1)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts (x, y) coordinates to a flat vector index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    pub fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if self.is_valid(x, y) {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Cell a position falls into, if it lies on this grid.
    pub fn cell_of(&self, position: Position) -> Option<(usize, usize)> {
        position
            .cell()
            .filter(|&(x, y)| self.is_valid(x, y))
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get_mut(index)
    }

    /// Mutable cell containing `position`, if any.
    pub fn at_mut(&mut self, position: Position) -> Option<&mut T> {
        let (x, y) = self.cell_of(position)?;
        self.get_mut(x, y)
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (x, y) = index;
        match self.coords_to_index(x, y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}
