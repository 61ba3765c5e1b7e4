//! Discrete coordinate space the game is played on.

use serde::{Deserialize, Serialize};

use super::action::Direction;

/// A cell on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }

    /// Offset (dx, dy) from self to other
    pub fn offset_to(&self, other: Position) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    /// Chebyshev distance, used for guard zones around spawn cells
    pub fn chebyshev(&self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Bounds of the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Check if a position is within the grid bounds
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width as i32 && pos.y >= 0 && pos.y < self.height as i32
    }

    pub fn center(&self) -> Position {
        Position::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_by(1, 0), Position::new(6, 5));
        assert_eq!(pos.moved_by(-1, 0), Position::new(4, 5));
        assert_eq!(pos.moved_in_direction(Direction::Up), Position::new(5, 4));
        assert_eq!(pos.moved_in_direction(Direction::Down), Position::new(5, 6));
    }

    #[test]
    fn test_bounds_checking() {
        let grid = Grid::new(20, 20);

        assert!(grid.contains(Position::new(0, 0)));
        assert!(grid.contains(Position::new(19, 19)));
        assert!(!grid.contains(Position::new(-1, 0)));
        assert!(!grid.contains(Position::new(20, 0)));
        assert!(!grid.contains(Position::new(0, 20)));
    }

    #[test]
    fn test_cells_cover_grid() {
        let grid = Grid::new(3, 2);
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), grid.cell_count());
        assert_eq!(cells[0], Position::new(0, 0));
        assert_eq!(cells[3], Position::new(0, 1));
    }

    #[test]
    fn test_chebyshev() {
        let a = Position::new(0, 0);
        assert_eq!(a.chebyshev(Position::new(1, 1)), 1);
        assert_eq!(a.chebyshev(Position::new(-3, 2)), 3);
    }
}
