//! Placement of food, power-ups and maze obstacles.

use std::collections::HashSet;

use rand::Rng;

use super::config::GameConfig;
use super::grid::{Grid, Position};
use super::state::{Food, FoodKind, PowerUpKind};

/// Shapes the maze generator lays down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstaclePattern {
    /// Horizontal run of 3-7 cells
    Horizontal,
    /// Vertical run of 3-7 cells
    Vertical,
    /// Two legs of 3-5 cells meeting at a corner
    LShape,
    /// 3-7 single cells away from the board centre
    Scattered,
}

impl ObstaclePattern {
    const ALL: [ObstaclePattern; 4] = [
        ObstaclePattern::Horizontal,
        ObstaclePattern::Vertical,
        ObstaclePattern::LShape,
        ObstaclePattern::Scattered,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Find an unoccupied cell.
///
/// Draws uniformly up to `attempts` times, then falls back to a row-major scan so a
/// nearly full board still terminates. Returns `None` only when every cell is taken.
pub fn free_cell<R: Rng + ?Sized>(
    rng: &mut R,
    grid: &Grid,
    occupied: &HashSet<Position>,
    attempts: usize,
) -> Option<Position> {
    for _ in 0..attempts {
        let pos = Position::new(
            rng.gen_range(0..grid.width) as i32,
            rng.gen_range(0..grid.height) as i32,
        );
        if !occupied.contains(&pos) {
            return Some(pos);
        }
    }

    let fallback = grid.cells().find(|pos| !occupied.contains(pos));
    if fallback.is_some() {
        tracing::warn!(attempts, "random spawn exhausted, used linear scan");
    }
    fallback
}

pub fn spawn_food<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GameConfig,
    grid: &Grid,
    occupied: &HashSet<Position>,
) -> Option<Food> {
    let kind = if rng.gen_bool(config.special_food_chance) {
        FoodKind::Special
    } else {
        FoodKind::Normal
    };
    free_cell(rng, grid, occupied, config.spawn_attempts).map(|position| Food { position, kind })
}

pub fn random_power_up_kind<R: Rng + ?Sized>(rng: &mut R) -> PowerUpKind {
    PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())]
}

/// Cells of one pattern; may include cells outside the grid, which the caller drops
pub fn pattern_cells<R: Rng + ?Sized>(
    rng: &mut R,
    grid: &Grid,
    pattern: ObstaclePattern,
) -> Vec<Position> {
    let width = grid.width as i32;
    let height = grid.height as i32;

    match pattern {
        ObstaclePattern::Horizontal => {
            let len = rng.gen_range(3..=7);
            let y = rng.gen_range(2..height - 2);
            let start_x = rng.gen_range(0..width - len);
            (0..len).map(|j| Position::new(start_x + j, y)).collect()
        }
        ObstaclePattern::Vertical => {
            let len = rng.gen_range(3..=7);
            let x = rng.gen_range(2..width - 2);
            let start_y = rng.gen_range(0..height - len);
            (0..len).map(|j| Position::new(x, start_y + j)).collect()
        }
        ObstaclePattern::LShape => {
            let corner_x = rng.gen_range(3..width - 3);
            let corner_y = rng.gen_range(3..height - 3);
            let leg = rng.gen_range(3..=5);
            (0..leg)
                .flat_map(|j| {
                    [
                        Position::new(corner_x - j, corner_y),
                        Position::new(corner_x, corner_y + j),
                    ]
                })
                .collect()
        }
        ObstaclePattern::Scattered => {
            let center = grid.center();
            let count = rng.gen_range(3..=7);
            (0..count)
                .map(|_| {
                    Position::new(rng.gen_range(0..width), rng.gen_range(0..height))
                })
                .filter(|pos| (pos.x - center.x).abs() > 3 || (pos.y - center.y).abs() > 3)
                .collect()
        }
    }
}

/// Lay out the maze for `level`.
///
/// `guarded` cells (the start cell and current snake body) keep a clear zone of
/// `obstacle_guard_radius`; `blocked` cells (food, power-ups) are never covered.
pub fn generate_obstacles<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GameConfig,
    grid: &Grid,
    level: u32,
    guarded: &[Position],
    blocked: &HashSet<Position>,
) -> Vec<Position> {
    let patterns = level.clamp(1, config.max_obstacle_patterns.max(1));
    let mut seen = HashSet::new();
    let mut obstacles = Vec::new();

    for _ in 0..patterns {
        let pattern = ObstaclePattern::random(rng);
        for pos in pattern_cells(rng, grid, pattern) {
            if grid.contains(pos) && seen.insert(pos) {
                obstacles.push(pos);
            }
        }
    }

    obstacles.retain(|obstacle| {
        !blocked.contains(obstacle)
            && guarded
                .iter()
                .all(|cell| cell.chebyshev(*obstacle) >= config.obstacle_guard_radius)
    });
    obstacles
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_free_cell_avoids_occupied() {
        let grid = Grid::new(10, 10);
        let mut rng = StdRng::seed_from_u64(7);
        let occupied: HashSet<Position> = grid.cells().filter(|p| p.x < 9).collect();

        for _ in 0..50 {
            let pos = free_cell(&mut rng, &grid, &occupied, 64).unwrap();
            assert!(!occupied.contains(&pos));
            assert_eq!(pos.x, 9);
        }
    }

    #[test]
    fn test_free_cell_scans_when_draws_run_out() {
        let grid = Grid::new(10, 10);
        let mut rng = StdRng::seed_from_u64(1);
        let free = Position::new(6, 8);
        let occupied: HashSet<Position> = grid.cells().filter(|p| *p != free).collect();

        // Zero random attempts forces the scan path
        assert_eq!(free_cell(&mut rng, &grid, &occupied, 0), Some(free));
    }

    #[test]
    fn test_free_cell_on_full_board() {
        let grid = Grid::new(10, 10);
        let mut rng = StdRng::seed_from_u64(1);
        let occupied: HashSet<Position> = grid.cells().collect();
        assert_eq!(free_cell(&mut rng, &grid, &occupied, 64), None);
    }

    #[test]
    fn test_dense_boards_never_collide() {
        let config = GameConfig::default();
        let grid = config.grid();

        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let occupied: HashSet<Position> = grid
                .cells()
                .filter(|_| rng.gen_bool(0.97))
                .collect();
            if occupied.len() == grid.cell_count() {
                continue;
            }
            let food = spawn_food(&mut rng, &config, &grid, &occupied).unwrap();
            assert!(!occupied.contains(&food.position));
            assert!(grid.contains(food.position));
        }
    }

    #[test]
    fn test_pattern_sizes() {
        let grid = Grid::new(20, 20);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let horizontal = pattern_cells(&mut rng, &grid, ObstaclePattern::Horizontal);
            assert!((3..=7).contains(&horizontal.len()));
            assert!(horizontal.iter().all(|p| p.y == horizontal[0].y));
            assert!(horizontal.iter().all(|p| grid.contains(*p)));

            let vertical = pattern_cells(&mut rng, &grid, ObstaclePattern::Vertical);
            assert!((3..=7).contains(&vertical.len()));
            assert!(vertical.iter().all(|p| p.x == vertical[0].x));

            let l_shape = pattern_cells(&mut rng, &grid, ObstaclePattern::LShape);
            assert!((6..=10).contains(&l_shape.len()));

            let scattered = pattern_cells(&mut rng, &grid, ObstaclePattern::Scattered);
            assert!(scattered.len() <= 7);
        }
    }

    #[test]
    fn test_obstacles_keep_clear_of_guarded_cells() {
        let config = GameConfig::default();
        let grid = config.grid();
        let start = config.player_start();
        let food = Position::new(3, 3);
        let blocked: HashSet<Position> = [food].into_iter().collect();

        for seed in 0..100u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let obstacles = generate_obstacles(&mut rng, &config, &grid, 5, &[start], &blocked);
            for obstacle in &obstacles {
                assert!(grid.contains(*obstacle));
                assert!(start.chebyshev(*obstacle) >= config.obstacle_guard_radius);
                assert_ne!(*obstacle, food);
            }
            let unique: HashSet<_> = obstacles.iter().collect();
            assert_eq!(unique.len(), obstacles.len());
        }
    }
}
