//! Grid coordinates and map bounds.

use serde::{Deserialize, Serialize};

/// One grid coordinate. May lie outside a map until checked with
/// [`GridDimensions::contains`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Size of a map in cells. Fixed when the map is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub width: u32,
    pub height: u32,
}

impl GridDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `0 <= x < width && 0 <= y < height`.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && i64::from(cell.x) < i64::from(self.width)
            && i64::from(cell.y) < i64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn max_x(&self) -> i32 {
        i32::try_from(self.width).unwrap_or(i32::MAX) - 1
    }

    fn max_y(&self) -> i32 {
        i32::try_from(self.height).unwrap_or(i32::MAX) - 1
    }

    /// Intersect an inclusive cell range with the grid.
    ///
    /// Returns `None` when the range and the grid do not overlap.
    pub fn clip(&self, min: Cell, max: Cell) -> Option<CellRect> {
        if self.is_empty() {
            return None;
        }
        let rect = CellRect {
            min: Cell::new(min.x.max(0), min.y.max(0)),
            max: Cell::new(max.x.min(self.max_x()), max.y.min(self.max_y())),
        };
        (rect.min.x <= rect.max.x && rect.min.y <= rect.max.y).then_some(rect)
    }
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub min: Cell,
    pub max: Cell,
}

impl CellRect {
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (self.min.y..=self.max.y)
            .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| Cell::new(x, y)))
    }

    pub fn cell_count(&self) -> usize {
        let w = usize::try_from(self.max.x - self.min.x + 1).unwrap_or(0);
        let h = usize::try_from(self.max.y - self.min.y + 1).unwrap_or(0);
        w * h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_bounds() {
        let dims = GridDimensions::new(10, 5);
        assert!(dims.contains(Cell::new(0, 0)));
        assert!(dims.contains(Cell::new(9, 4)));
        assert!(!dims.contains(Cell::new(10, 4)));
        assert!(!dims.contains(Cell::new(9, 5)));
        assert!(!dims.contains(Cell::new(-1, 0)));
    }

    #[test]
    fn test_clip_partial_and_disjoint() {
        let dims = GridDimensions::new(10, 10);
        let rect = dims.clip(Cell::new(-3, 8), Cell::new(2, 14)).unwrap();
        assert_eq!(rect.min, Cell::new(0, 8));
        assert_eq!(rect.max, Cell::new(2, 9));
        assert_eq!(rect.cell_count(), 6);
        assert_eq!(rect.cells().count(), 6);

        assert!(dims.clip(Cell::new(12, 0), Cell::new(20, 3)).is_none());
        assert!(dims.clip(Cell::new(-9, -9), Cell::new(-1, -1)).is_none());
    }
}
