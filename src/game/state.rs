use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action::Direction;
use super::grid::{Grid, Position};
use super::mode::GameMode;
use super::schedule::Scheduler;

/// A snake on the board
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at the front
    pub body: VecDeque<Position>,
    /// Direction applied on the last tick
    pub direction: Direction,
    /// Latched input, applied at the start of the next tick
    requested: Direction,
}

impl Snake {
    /// Create a new snake with given starting position and direction
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let mut body = VecDeque::with_capacity(length.max(1));
        body.push_back(head);

        // Add initial body segments behind the head
        let back = direction.opposite();
        for _ in 1..length {
            let prev = body[body.len() - 1];
            body.push_back(prev.moved_in_direction(back));
        }

        Self {
            body,
            direction,
            requested: direction,
        }
    }

    /// Build a snake from explicit segments, head first
    pub fn from_segments(
        segments: impl IntoIterator<Item = Position>,
        direction: Direction,
    ) -> Option<Self> {
        let body: VecDeque<Position> = segments.into_iter().collect();
        if body.is_empty() {
            return None;
        }
        Some(Self {
            body,
            direction,
            requested: direction,
        })
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Body segments excluding the head
    pub fn body_segments(&self) -> impl Iterator<Item = &Position> + '_ {
        self.body.iter().skip(1)
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().any(|segment| *segment == pos)
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    pub fn requested_direction(&self) -> Direction {
        self.requested
    }

    /// Latch a direction for the next tick.
    ///
    /// Returns false when the request is the exact reverse of the current heading.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.direction.is_opposite(direction) {
            return false;
        }
        self.requested = direction;
        true
    }

    /// Commit the latched direction and return the cell the head moves into
    pub fn turn(&mut self) -> Position {
        self.direction = self.requested;
        self.head().moved_in_direction(self.direction)
    }

    /// Move snake in current direction, growing if should_grow is true
    pub fn move_snake(&mut self, should_grow: bool) {
        let new_head = self.head().moved_in_direction(self.direction);
        self.body.push_front(new_head);

        if !should_grow {
            self.body.pop_back();
        }
    }

    /// Keep only the first `len` segments (never below one)
    pub fn truncate(&mut self, len: usize) {
        self.body.truncate(len.max(1));
    }

    /// Put the snake back to a single segment at `head`
    pub fn reset(&mut self, head: Position, direction: Direction) {
        self.body.clear();
        self.body.push_back(head);
        self.direction = direction;
        self.requested = direction;
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Normal,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
    pub position: Position,
    pub kind: FoodKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Speed,
    Slow,
    Immortal,
    DoublePoints,
    Shrink,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::Speed,
        PowerUpKind::Slow,
        PowerUpKind::Immortal,
        PowerUpKind::DoublePoints,
        PowerUpKind::Shrink,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PowerUpKind::Speed => "Speed",
            PowerUpKind::Slow => "Slow",
            PowerUpKind::Immortal => "Immortal",
            PowerUpKind::DoublePoints => "2x Points",
            PowerUpKind::Shrink => "Shrink",
        }
    }
}

/// A pickup lying on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u64,
    pub position: Position,
    pub kind: PowerUpKind,
}

/// The effect currently applied to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub started_ms: u64,
    pub expires_ms: u64,
}

impl ActivePowerUp {
    /// Share of the effect still left at `now_ms`, in [0, 1]
    pub fn remaining_fraction(&self, now_ms: u64) -> f32 {
        let total = self.expires_ms.saturating_sub(self.started_ms);
        if total == 0 {
            return 0.0;
        }
        let left = self.expires_ms.saturating_sub(now_ms);
        (left as f32 / total as f32).clamp(0.0, 1.0)
    }
}

/// Type of collision that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionType {
    /// Snake left the board
    Wall,
    /// Snake hit itself
    SelfCollision,
    /// Snake hit a maze obstacle
    Obstacle,
    /// Snake hit the other snake
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Time,
    Collision,
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Running,
    /// Short pause after a lost life, before the snake is put back
    Respawning,
    GameOver(GameOverReason),
}

/// Complete state of one game, owned by the front end and mutated by the engine
#[derive(Debug, Clone)]
pub struct GameSession {
    pub mode: GameMode,
    pub grid: Grid,
    pub snake: Snake,
    /// Battle-mode opponent
    pub opponent: Option<Snake>,
    pub food: Option<Food>,
    pub power_ups: Vec<PowerUp>,
    pub obstacles: Vec<Position>,
    pub score: u32,
    pub opponent_score: u32,
    pub level: u32,
    pub lives: u32,
    /// Countdown left in time-trial sessions
    pub remaining_time: Option<Duration>,
    pub elapsed: Duration,
    pub active_power_up: Option<ActivePowerUp>,
    pub tick_interval: Duration,
    pub paused: bool,
    pub phase: Phase,
    /// Engine clock in milliseconds, advanced by the tick interval
    pub clock_ms: u64,
    pub ticks: u64,
    pub(crate) scheduler: Scheduler,
    pub(crate) next_power_up_id: u64,
}

impl GameSession {
    pub fn is_immortal(&self) -> bool {
        matches!(
            self.active_power_up,
            Some(ActivePowerUp {
                kind: PowerUpKind::Immortal,
                ..
            })
        )
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.obstacles.contains(&pos)
    }

    /// Every cell a newly spawned item must avoid
    pub fn occupied_cells(&self) -> HashSet<Position> {
        let mut occupied: HashSet<Position> = self.snake.body.iter().copied().collect();
        if let Some(opponent) = &self.opponent {
            occupied.extend(opponent.body.iter().copied());
        }
        occupied.extend(self.obstacles.iter().copied());
        occupied.extend(self.power_ups.iter().map(|p| p.position));
        if let Some(food) = self.food {
            occupied.insert(food.position);
        }
        occupied
    }

    /// Read-only view handed to the presentation layer
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            grid: self.grid,
            snake: self.snake.body.iter().copied().collect(),
            snake_direction: self.snake.direction,
            opponent: self
                .opponent
                .as_ref()
                .map(|snake| snake.body.iter().copied().collect()),
            food: self.food,
            power_ups: self.power_ups.clone(),
            obstacles: self.obstacles.clone(),
            score: self.score,
            opponent_score: self.opponent_score,
            level: self.level,
            lives: self.lives,
            remaining_time: self.remaining_time,
            elapsed: self.elapsed,
            active_power_up: self.active_power_up.map(|active| ActiveEffectView {
                kind: active.kind,
                remaining_fraction: active.remaining_fraction(self.clock_ms),
            }),
            immortal: self.is_immortal(),
            paused: self.paused,
            phase: self.phase,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveEffectView {
    pub kind: PowerUpKind,
    pub remaining_fraction: f32,
}

/// Render view of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub mode: GameMode,
    pub grid: Grid,
    pub snake: Vec<Position>,
    pub snake_direction: Direction,
    pub opponent: Option<Vec<Position>>,
    pub food: Option<Food>,
    pub power_ups: Vec<PowerUp>,
    pub obstacles: Vec<Position>,
    pub score: u32,
    pub opponent_score: u32,
    pub level: u32,
    pub lives: u32,
    pub remaining_time: Option<Duration>,
    pub elapsed: Duration,
    pub active_power_up: Option<ActiveEffectView>,
    pub immortal: bool,
    pub paused: bool,
    pub phase: Phase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_creation() {
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 3);
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(5, 5));
        assert_eq!(snake.body[1], Position::new(4, 5));
        assert_eq!(snake.body.back(), Some(&Position::new(3, 5)));
    }

    #[test]
    fn test_snake_movement() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 3);

        // Move without growing
        snake.move_snake(false);
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(6, 5));

        // Move with growing
        snake.move_snake(true);
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.head(), Position::new(7, 5));
    }

    #[test]
    fn test_collision_detection() {
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 3);
        assert!(!snake.collides_with_body(Position::new(5, 5))); // head
        assert!(snake.collides_with_body(Position::new(4, 5))); // body
        assert!(!snake.collides_with_body(Position::new(10, 10))); // empty
    }

    #[test]
    fn test_steer_rejects_reverse() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 3);
        assert!(!snake.steer(Direction::Left));
        assert_eq!(snake.requested_direction(), Direction::Right);

        assert!(snake.steer(Direction::Up));
        // Still judged against the committed heading, not the latched one
        assert!(snake.steer(Direction::Down));
        assert_eq!(snake.requested_direction(), Direction::Down);

        let next = snake.turn();
        assert_eq!(snake.direction, Direction::Down);
        assert_eq!(next, Position::new(5, 6));
    }

    #[test]
    fn test_truncate_keeps_head() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 4);
        snake.truncate(0);
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Position::new(5, 5));
    }

    #[test]
    fn test_from_segments_rejects_empty() {
        assert!(Snake::from_segments(Vec::new(), Direction::Up).is_none());
        let snake =
            Snake::from_segments([Position::new(1, 1), Position::new(1, 2)], Direction::Up)
                .unwrap();
        assert_eq!(snake.head(), Position::new(1, 1));
    }

    #[test]
    fn test_remaining_fraction() {
        let active = ActivePowerUp {
            kind: PowerUpKind::Speed,
            started_ms: 1_000,
            expires_ms: 6_000,
        };
        assert_eq!(active.remaining_fraction(1_000), 1.0);
        assert_eq!(active.remaining_fraction(3_500), 0.5);
        assert_eq!(active.remaining_fraction(9_000), 0.0);
    }
}
