//! Greedy controller for the battle-mode opponent.
//!
//! The opponent heads for the food along the axis with the larger offset and only
//! deviates when the chosen cell is unsafe. Deviations are tried in the fixed order
//! of [`Direction::ALL`] (up, right, down, left), skipping the reverse of the
//! current heading. When nothing is safe it keeps the greedy choice and collides.

use super::action::Direction;
use super::grid::{Grid, Position};
use super::state::Snake;

/// Everything besides its own body that the opponent must steer around
#[derive(Debug, Clone, Copy)]
pub struct Hazards<'a> {
    pub grid: &'a Grid,
    pub obstacles: &'a [Position],
    pub rival: &'a Snake,
}

impl Hazards<'_> {
    /// Whether moving `own` into `pos` would collide.
    ///
    /// The last tail cell is ignored because it moves out of the way this tick.
    pub fn blocks(&self, own: &Snake, pos: Position) -> bool {
        if !self.grid.contains(pos) || self.obstacles.contains(&pos) || self.rival.occupies(pos) {
            return true;
        }
        let moving_len = own.len().saturating_sub(1);
        own.body.iter().take(moving_len).any(|segment| *segment == pos)
    }
}

/// Direction that closes the larger of the two axis offsets to `food`
pub fn greedy_direction(own: &Snake, food: Position) -> Direction {
    let (dx, dy) = own.head().offset_to(food);
    let heading = own.direction;

    let wanted = if dx.abs() > dy.abs() {
        match dx.signum() {
            1 => Some(Direction::Right),
            -1 => Some(Direction::Left),
            _ => None,
        }
    } else {
        match dy.signum() {
            1 => Some(Direction::Down),
            -1 => Some(Direction::Up),
            _ => None,
        }
    };

    match wanted {
        Some(dir) if !heading.is_opposite(dir) => dir,
        _ => heading,
    }
}

/// Pick the opponent's next heading
pub fn choose_direction(own: &Snake, food: Option<Position>, hazards: &Hazards<'_>) -> Direction {
    let preferred = food
        .map(|food| greedy_direction(own, food))
        .unwrap_or(own.direction);

    let head = own.head();
    if !hazards.blocks(own, head.moved_in_direction(preferred)) {
        return preferred;
    }

    let reverse = own.direction.opposite();
    Direction::ALL
        .into_iter()
        .filter(|dir| *dir != reverse)
        .find(|dir| !hazards.blocks(own, head.moved_in_direction(*dir)))
        .unwrap_or(preferred)
}
