use std::collections::HashSet;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{
    action::{Action, Direction},
    config::GameConfig,
    mode::GameMode,
    opponent::{self, Hazards},
    schedule::{ScheduledEvent, Scheduler},
    spawn,
    state::{
        ActivePowerUp, CollisionType, Food, FoodKind, GameOverReason, GameSession, Phase,
        PowerUp, PowerUpKind, Snake,
    },
};

/// Something the presentation layer may want to react to (sound, flash, log)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    AteFood { kind: FoodKind, points: u32 },
    LevelUp { level: u32 },
    PowerUpSpawned { kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    PowerUpDespawned { kind: PowerUpKind },
    OpponentAteFood { kind: FoodKind, points: u32 },
    OpponentCrashed,
    LifeLost { collision: CollisionType, lives_left: u32 },
    Respawned,
    GameOver { reason: GameOverReason },
}

/// What a tick did overall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused or already over; nothing changed
    Idle,
    /// Snakes moved without losing a life
    Advanced,
    /// Waiting out the pause after a lost life
    Respawning,
    LifeLost(CollisionType),
    GameOver(GameOverReason),
}

/// Result of a game tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    pub outcome: TickOutcome,
    pub events: Vec<GameEvent>,
    /// Interval the next tick should be scheduled with
    pub tick_interval: Duration,
    /// True when the front end has to reschedule its timer
    pub interval_changed: bool,
}

impl TickResult {
    fn idle(tick_interval: Duration) -> Self {
        Self {
            outcome: TickOutcome::Idle,
            events: Vec::new(),
            tick_interval,
            interval_changed: false,
        }
    }

    pub fn ate_food(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, GameEvent::AteFood { .. }))
    }
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Start a fresh session for `mode`
    pub fn new_session(&mut self, mode: GameMode) -> GameSession {
        let rules = mode.rules();
        let grid = self.config.grid();

        let mut session = GameSession {
            mode,
            grid,
            snake: Snake::new(self.config.player_start(), Direction::Right, 1),
            opponent: rules
                .opponent
                .then(|| Snake::new(self.config.opponent_start(), Direction::Left, 1)),
            food: None,
            power_ups: Vec::new(),
            obstacles: Vec::new(),
            score: 0,
            opponent_score: 0,
            level: 1,
            lives: self.config.initial_lives,
            remaining_time: rules.countdown.then(|| self.config.time_limit()),
            elapsed: Duration::ZERO,
            active_power_up: None,
            tick_interval: self.config.level_interval(1),
            paused: false,
            phase: Phase::Running,
            clock_ms: 0,
            ticks: 0,
            scheduler: Scheduler::new(),
            next_power_up_id: 0,
        };

        if rules.obstacles {
            self.regenerate_obstacles(&mut session);
        }
        self.respawn_food(&mut session);
        if rules.power_ups {
            session.scheduler.schedule(
                self.config.power_up_roll_interval_ms,
                ScheduledEvent::PowerUpRoll,
            );
        }

        tracing::info!(%mode, obstacles = session.obstacles.len(), "session started");
        session
    }

    /// Apply player input. Returns false when the input was ignored.
    ///
    /// Direction changes are latched for the next tick; reversals and input while
    /// paused, respawning or after game over are dropped.
    pub fn handle_action(&self, session: &mut GameSession, action: Action) -> bool {
        match action {
            Action::Move(direction) => {
                if session.paused || session.is_over() || session.phase == Phase::Respawning {
                    return false;
                }
                session.snake.steer(direction)
            }
            Action::TogglePause => {
                if session.is_over() {
                    return false;
                }
                session.paused = !session.paused;
                tracing::debug!(paused = session.paused, "pause toggled");
                true
            }
        }
    }

    /// Advance the session by one tick
    pub fn tick(&mut self, session: &mut GameSession) -> TickResult {
        let previous_interval = session.tick_interval;
        let mut result = TickResult::idle(previous_interval);

        if session.paused || session.is_over() {
            return result;
        }

        session.clock_ms += previous_interval.as_millis() as u64;
        session.elapsed += previous_interval;
        session.ticks += 1;

        result.outcome = self.run_tick(session, previous_interval, &mut result.events);
        result.tick_interval = session.tick_interval;
        result.interval_changed = session.tick_interval != previous_interval;
        result
    }

    fn run_tick(
        &mut self,
        session: &mut GameSession,
        dt: Duration,
        events: &mut Vec<GameEvent>,
    ) -> TickOutcome {
        if let Some(remaining) = session.remaining_time {
            let remaining = remaining.saturating_sub(dt);
            session.remaining_time = Some(remaining);
            if remaining.is_zero() {
                return self.end_game(session, GameOverReason::Time, events);
            }
        }

        self.fire_due_events(session, events);
        if session.phase == Phase::Respawning {
            return TickOutcome::Respawning;
        }

        let new_head = session.snake.turn();
        let eaten = session.food.filter(|food| food.position == new_head);
        session.snake.move_snake(eaten.is_some());
        if let Some(food) = eaten {
            self.player_ate(session, food, events);
        }

        let opponent_crashed = self.advance_opponent(session, events);

        self.collect_power_up(session, events);

        if session.food.is_none() {
            self.respawn_food(session);
        }

        // Checked against the crashed opponent before it is reset
        let collision = self.detect_collision(session);
        if opponent_crashed {
            self.reset_opponent(session);
        }

        match collision {
            Some(_) if session.is_immortal() => TickOutcome::Advanced,
            Some(collision) => self.lose_life(session, collision, events),
            None => TickOutcome::Advanced,
        }
    }

    fn fire_due_events(&mut self, session: &mut GameSession, events: &mut Vec<GameEvent>) {
        while let Some(event) = session.scheduler.pop_due(session.clock_ms) {
            match event {
                ScheduledEvent::EffectExpired => {
                    if let Some(active) = session.active_power_up.take() {
                        tracing::debug!(kind = ?active.kind, "power-up expired");
                        events.push(GameEvent::PowerUpExpired { kind: active.kind });
                        session.tick_interval = self.effective_interval(session);
                    }
                }
                ScheduledEvent::PowerUpDespawn { id } => {
                    if let Some(idx) = session.power_ups.iter().position(|p| p.id == id) {
                        let power_up = session.power_ups.remove(idx);
                        events.push(GameEvent::PowerUpDespawned {
                            kind: power_up.kind,
                        });
                    }
                }
                ScheduledEvent::PowerUpRoll => {
                    if self.rng.gen_bool(self.config.power_up_roll_chance) {
                        self.spawn_power_up(session, events);
                    }
                    session.scheduler.schedule(
                        session.clock_ms + self.config.power_up_roll_interval_ms,
                        ScheduledEvent::PowerUpRoll,
                    );
                }
                ScheduledEvent::Respawn => {
                    session
                        .snake
                        .reset(self.config.player_start(), Direction::Right);
                    session.phase = Phase::Running;
                    events.push(GameEvent::Respawned);
                }
            }
        }
    }

    fn food_points(&self, kind: FoodKind) -> u32 {
        match kind {
            FoodKind::Normal => self.config.normal_food_points,
            FoodKind::Special => self.config.special_food_points,
        }
    }

    fn player_ate(&mut self, session: &mut GameSession, food: Food, events: &mut Vec<GameEvent>) {
        let mut points = self.food_points(food.kind);
        if matches!(
            session.active_power_up,
            Some(ActivePowerUp {
                kind: PowerUpKind::DoublePoints,
                ..
            })
        ) {
            points *= 2;
        }
        session.score += points;
        events.push(GameEvent::AteFood {
            kind: food.kind,
            points,
        });

        session.food = None;
        self.respawn_food(session);

        if session.mode.rules().power_ups && self.rng.gen_bool(self.config.power_up_chance_on_eat)
        {
            self.spawn_power_up(session, events);
        }

        let level = self.config.level_for_score(session.score);
        if level > session.level {
            session.level = level;
            session.tick_interval = self.effective_interval(session);
            if session.mode.rules().obstacles {
                self.regenerate_obstacles(session);
            }
            tracing::debug!(level, interval = ?session.tick_interval, "level up");
            events.push(GameEvent::LevelUp { level });
        }
    }

    /// Move the opponent one step. Returns true when it crashed; the caller
    /// resets it once the player's collision has been checked.
    fn advance_opponent(
        &mut self,
        session: &mut GameSession,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let Some(mut rival) = session.opponent.take() else {
            return false;
        };

        let food = session.food;
        let direction = {
            let hazards = Hazards {
                grid: &session.grid,
                obstacles: &session.obstacles,
                rival: &session.snake,
            };
            opponent::choose_direction(&rival, food.map(|f| f.position), &hazards)
        };
        rival.steer(direction);
        let next = rival.turn();
        let eaten = food.filter(|food| food.position == next);
        rival.move_snake(eaten.is_some());

        let crashed = !session.grid.contains(next)
            || session.is_obstacle(next)
            || rival.collides_with_body(next)
            || session.snake.occupies(next);
        if crashed {
            tracing::debug!(at = ?next, "opponent crashed");
            events.push(GameEvent::OpponentCrashed);
        }
        session.opponent = Some(rival);

        if let Some(food) = eaten {
            let points = self.food_points(food.kind);
            session.opponent_score += points;
            events.push(GameEvent::OpponentAteFood {
                kind: food.kind,
                points,
            });
            session.food = None;
            self.respawn_food(session);
        }
        crashed
    }

    /// Put the opponent back on its start cell, or on a free cell when the
    /// start is taken
    fn reset_opponent(&mut self, session: &mut GameSession) {
        let Some(mut rival) = session.opponent.take() else {
            return;
        };

        let occupied = session.occupied_cells();
        let start = self.config.opponent_start();
        let cell = if occupied.contains(&start) {
            spawn::free_cell(
                &mut self.rng,
                &session.grid,
                &occupied,
                self.config.spawn_attempts,
            )
        } else {
            Some(start)
        };

        match cell {
            Some(cell) => rival.reset(cell, Direction::Left),
            None => tracing::warn!("no free cell left for the opponent"),
        }
        session.opponent = Some(rival);
    }

    fn collect_power_up(&mut self, session: &mut GameSession, events: &mut Vec<GameEvent>) {
        let head = session.snake.head();
        let Some(idx) = session.power_ups.iter().position(|p| p.position == head) else {
            return;
        };

        let power_up = session.power_ups.remove(idx);
        let id = power_up.id;
        session
            .scheduler
            .cancel(|event| *event == ScheduledEvent::PowerUpDespawn { id });
        self.activate(session, power_up.kind);
        events.push(GameEvent::PowerUpCollected {
            kind: power_up.kind,
        });
    }

    /// Apply a power-up, replacing whatever effect was active
    fn activate(&mut self, session: &mut GameSession, kind: PowerUpKind) {
        if session.active_power_up.take().is_some() {
            session
                .scheduler
                .cancel(|event| *event == ScheduledEvent::EffectExpired);
        }

        if kind == PowerUpKind::Shrink && session.snake.len() > self.config.shrink_min_length {
            let half = session.snake.len() / 2;
            session.snake.truncate(half);
        }

        let now = session.clock_ms;
        let expires_ms = now + self.config.power_up_duration_ms;
        session.active_power_up = Some(ActivePowerUp {
            kind,
            started_ms: now,
            expires_ms,
        });
        session
            .scheduler
            .schedule(expires_ms, ScheduledEvent::EffectExpired);
        session.tick_interval = self.effective_interval(session);
        tracing::debug!(?kind, expires_ms, "power-up activated");
    }

    /// Level interval adjusted by the active speed or slow effect
    fn effective_interval(&self, session: &GameSession) -> Duration {
        let base = self.config.level_interval(session.level).as_millis() as f64;
        let ms = match session.active_power_up.map(|active| active.kind) {
            Some(PowerUpKind::Speed) => (base * self.config.speed_factor)
                .round()
                .max(self.config.min_boosted_interval_ms as f64),
            Some(PowerUpKind::Slow) => (base * self.config.slow_factor).round(),
            _ => base,
        };
        Duration::from_millis(ms as u64)
    }

    fn detect_collision(&self, session: &GameSession) -> Option<CollisionType> {
        let head = session.snake.head();

        if !session.grid.contains(head) {
            return Some(CollisionType::Wall);
        }
        if session.snake.collides_with_body(head) {
            return Some(CollisionType::SelfCollision);
        }
        if session.mode.rules().obstacles && session.is_obstacle(head) {
            return Some(CollisionType::Obstacle);
        }
        if session
            .opponent
            .as_ref()
            .is_some_and(|rival| rival.occupies(head))
        {
            return Some(CollisionType::Opponent);
        }
        None
    }

    fn lose_life(
        &mut self,
        session: &mut GameSession,
        collision: CollisionType,
        events: &mut Vec<GameEvent>,
    ) -> TickOutcome {
        session.lives = session.lives.saturating_sub(1);
        events.push(GameEvent::LifeLost {
            collision,
            lives_left: session.lives,
        });

        if session.lives == 0 {
            return self.end_game(session, GameOverReason::Collision, events);
        }

        session.phase = Phase::Respawning;
        session.scheduler.schedule(
            session.clock_ms + self.config.respawn_delay_ms,
            ScheduledEvent::Respawn,
        );
        tracing::debug!(?collision, lives = session.lives, "life lost");
        TickOutcome::LifeLost(collision)
    }

    fn end_game(
        &mut self,
        session: &mut GameSession,
        reason: GameOverReason,
        events: &mut Vec<GameEvent>,
    ) -> TickOutcome {
        session.phase = Phase::GameOver(reason);
        session.scheduler.clear();
        events.push(GameEvent::GameOver { reason });
        tracing::info!(
            mode = %session.mode,
            score = session.score,
            level = session.level,
            ?reason,
            "game over"
        );
        TickOutcome::GameOver(reason)
    }

    fn respawn_food(&mut self, session: &mut GameSession) {
        let occupied = session.occupied_cells();
        session.food = spawn::spawn_food(&mut self.rng, &self.config, &session.grid, &occupied);
        if session.food.is_none() {
            tracing::warn!("no free cell left for food");
        }
    }

    fn spawn_power_up(&mut self, session: &mut GameSession, events: &mut Vec<GameEvent>) {
        let occupied = session.occupied_cells();
        let Some(position) = spawn::free_cell(
            &mut self.rng,
            &session.grid,
            &occupied,
            self.config.spawn_attempts,
        ) else {
            tracing::warn!("no free cell left for a power-up");
            return;
        };

        let kind = spawn::random_power_up_kind(&mut self.rng);
        let id = session.next_power_up_id;
        session.next_power_up_id += 1;
        session.power_ups.push(PowerUp { id, position, kind });
        session.scheduler.schedule(
            session.clock_ms + self.config.power_up_lifetime_ms,
            ScheduledEvent::PowerUpDespawn { id },
        );
        events.push(GameEvent::PowerUpSpawned { kind });
    }

    fn regenerate_obstacles(&mut self, session: &mut GameSession) {
        let mut guarded: Vec<_> = session.snake.body.iter().copied().collect();
        guarded.push(self.config.player_start());

        let mut blocked: HashSet<_> = session.power_ups.iter().map(|p| p.position).collect();
        if let Some(food) = session.food {
            blocked.insert(food.position);
        }

        session.obstacles = spawn::generate_obstacles(
            &mut self.rng,
            &self.config,
            &session.grid,
            session.level,
            &guarded,
            &blocked,
        );
    }
}
