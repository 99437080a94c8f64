//! Grid geometry: integer cells and fractional positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer grid cell. `(0, 0)` is the top-left corner; `y` grows
/// downwards.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Cell {
    /// Create a cell.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell displaced by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Whether the cell lies inside a square grid of side `size`.
    pub fn in_bounds(self, size: u32) -> bool {
        let size = size as i64;
        (0..size).contains(&(self.x as i64)) && (0..size).contains(&(self.y as i64))
    }

    /// The position of the cell's origin corner.
    pub fn to_position(self) -> Position {
        Position::new(self.x as f32, self.y as f32)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A fractional grid position.
///
/// Discrete variants keep integral coordinates; heading-based variants
/// move in fractions of a cell. The occupied cell is the floor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The cell containing this position.
    pub fn cell(self) -> Cell {
        Cell::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Clamp both coordinates into `[0, size - 1]`.
    pub fn clamp_to_grid(self, size: u32) -> Position {
        let max = size.saturating_sub(1) as f32;
        Position::new(self.x.clamp(0.0, max), self.y.clamp(0.0, max))
    }

    /// Linear interpolation towards `other` by `t` in `[0, 1]`.
    pub fn lerp(self, other: Position, t: f32) -> Position {
        Position::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl From<Cell> for Position {
    fn from(c: Cell) -> Self {
        c.to_position()
    }
}
