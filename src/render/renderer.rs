use std::collections::HashMap;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph},
};

use crate::game::{FoodKind, GameOverReason, Phase, Position, PowerUpKind, Snapshot};
use crate::metrics::GameMetrics;
use crate::persistence::HighScoreEntry;

/// High score tables and player tag shown around the board
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreTables<'a> {
    pub initials: &'a str,
    pub local: &'a [HighScoreEntry],
    pub world: &'a [HighScoreEntry],
}

/// What occupies one board cell, in drawing priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    SnakeHead,
    SnakeBody,
    OpponentHead,
    OpponentBody,
    Food(FoodKind),
    PowerUp(PowerUpKind),
    Obstacle,
    Empty,
}

/// Map every drawn cell to its content; entities outside the board are dropped
pub fn board_cells(snapshot: &Snapshot) -> HashMap<Position, Cell> {
    let mut cells = HashMap::new();
    let grid = snapshot.grid;
    let mut place = |pos: Position, cell: Cell| {
        if grid.contains(pos) {
            cells.entry(pos).or_insert(cell);
        }
    };

    if let Some(head) = snapshot.snake.first() {
        place(*head, Cell::SnakeHead);
    }
    for segment in snapshot.snake.iter().skip(1) {
        place(*segment, Cell::SnakeBody);
    }
    if let Some(opponent) = &snapshot.opponent {
        if let Some(head) = opponent.first() {
            place(*head, Cell::OpponentHead);
        }
        for segment in opponent.iter().skip(1) {
            place(*segment, Cell::OpponentBody);
        }
    }
    if let Some(food) = snapshot.food {
        place(food.position, Cell::Food(food.kind));
    }
    for power_up in &snapshot.power_ups {
        place(power_up.position, Cell::PowerUp(power_up.kind));
    }
    for obstacle in &snapshot.obstacles {
        place(*obstacle, Cell::Obstacle);
    }

    cells
}

fn power_up_glyph(kind: PowerUpKind) -> (&'static str, Color) {
    match kind {
        PowerUpKind::Speed => (">>", Color::LightYellow),
        PowerUpKind::Slow => ("<<", Color::LightBlue),
        PowerUpKind::Immortal => ("**", Color::LightMagenta),
        PowerUpKind::DoublePoints => ("x2", Color::LightGreen),
        PowerUpKind::Shrink => ("><", Color::LightCyan),
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        snapshot: &Snapshot,
        metrics: &GameMetrics,
        tables: ScoreTables<'_>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Length(1), // Power-up gauge
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(snapshot, metrics, tables.initials);
        frame.render_widget(stats, chunks[0]);

        if let Some(active) = snapshot.active_power_up {
            let (_, color) = power_up_glyph(active.kind);
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(color))
                .label(active.kind.label())
                .ratio(f64::from(active.remaining_fraction).clamp(0.0, 1.0));
            frame.render_widget(gauge, chunks[1]);
        }

        // Center the game grid horizontally
        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[2])[1];

        match snapshot.phase {
            Phase::GameOver(reason) => {
                let game_over = self.render_game_over(snapshot, metrics, reason, tables);
                frame.render_widget(game_over, game_area);
            }
            Phase::Running | Phase::Respawning => {
                let grid = self.render_grid(snapshot);
                frame.render_widget(grid, game_area);

                if snapshot.paused {
                    let popup = centered(game_area, 20, 3);
                    frame.render_widget(Clear, popup);
                    frame.render_widget(self.render_paused(), popup);
                }
            }
        }

        let controls = self.render_controls();
        frame.render_widget(controls, chunks[3]);
    }

    fn render_grid(&self, snapshot: &Snapshot) -> Paragraph<'_> {
        let cells = board_cells(snapshot);
        let head_color = if snapshot.immortal {
            Color::LightMagenta
        } else {
            Color::Cyan
        };

        let mut lines = Vec::with_capacity(snapshot.grid.height);
        for y in 0..snapshot.grid.height {
            let mut spans = Vec::with_capacity(snapshot.grid.width);

            for x in 0..snapshot.grid.width {
                let pos = Position::new(x as i32, y as i32);
                let span = match cells.get(&pos).copied().unwrap_or(Cell::Empty) {
                    Cell::SnakeHead => Span::styled(
                        "■ ",
                        Style::default().fg(head_color).add_modifier(Modifier::BOLD),
                    ),
                    Cell::SnakeBody => Span::styled("□ ", Style::default().fg(Color::Green)),
                    Cell::OpponentHead => Span::styled(
                        "◆ ",
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Cell::OpponentBody => {
                        Span::styled("◇ ", Style::default().fg(Color::Magenta))
                    }
                    Cell::Food(FoodKind::Normal) => Span::styled(
                        "O ",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                    Cell::Food(FoodKind::Special) => Span::styled(
                        "@ ",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Cell::PowerUp(kind) => {
                        let (glyph, color) = power_up_glyph(kind);
                        Span::styled(glyph, Style::default().fg(color))
                    }
                    Cell::Obstacle => Span::styled("▓▓", Style::default().fg(Color::Gray)),
                    Cell::Empty => Span::styled(". ", Style::default().fg(Color::DarkGray)),
                };
                spans.push(span);
            }

            lines.push(Line::from(spans));
        }

        let title = match snapshot.phase {
            Phase::Respawning => " Get ready... ".to_string(),
            _ => format!(" {} ", snapshot.mode.label()),
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(
        &self,
        snapshot: &Snapshot,
        metrics: &GameMetrics,
        initials: &str,
    ) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let mut first = vec![
            Span::styled("Score: ", label),
            Span::styled(
                snapshot.score.to_string(),
                value.add_modifier(Modifier::BOLD),
            ),
        ];
        if snapshot.opponent.is_some() {
            first.push(Span::raw("    "));
            first.push(Span::styled("AI: ", label));
            first.push(Span::styled(
                snapshot.opponent_score.to_string(),
                Style::default().fg(Color::Magenta),
            ));
        }
        first.extend([
            Span::raw("    "),
            Span::styled("Level: ", label),
            Span::styled(snapshot.level.to_string(), value),
            Span::raw("    "),
            Span::styled("Lives: ", label),
            Span::styled("♥".repeat(snapshot.lives as usize), Style::default().fg(Color::Red)),
            Span::raw("    "),
        ]);
        match snapshot.remaining_time {
            Some(left) => {
                let style = if left.as_secs() < 10 {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    value
                };
                first.push(Span::styled("Left: ", label));
                first.push(Span::styled(GameMetrics::format_time(left), style));
            }
            None => {
                first.push(Span::styled("Time: ", label));
                first.push(Span::styled(
                    GameMetrics::format_time(snapshot.elapsed),
                    value,
                ));
            }
        }

        let mut second = vec![
            Span::styled("Player: ", label),
            Span::styled(initials.to_string(), value),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(metrics.high_score.to_string(), value),
            Span::raw("    "),
            Span::styled("Games: ", label),
            Span::styled(metrics.games_played.to_string(), value),
        ];
        if let Some(last) = metrics.last_score {
            second.extend([
                Span::raw("    "),
                Span::styled("Last: ", label),
                Span::styled(last.to_string(), value),
                Span::raw("    "),
                Span::styled("Top Level: ", label),
                Span::styled(metrics.best_level.to_string(), value),
            ]);
        }

        Paragraph::new(vec![Line::from(first), Line::from(second)]).alignment(Alignment::Center)
    }

    fn render_paused(&self) -> Paragraph<'_> {
        Paragraph::new(Line::from(Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
    }

    fn render_game_over(
        &self,
        snapshot: &Snapshot,
        metrics: &GameMetrics,
        reason: GameOverReason,
        tables: ScoreTables<'_>,
    ) -> Paragraph<'_> {
        let headline = match reason {
            GameOverReason::Time => "TIME'S UP",
            GameOverReason::Collision => "GAME OVER",
        };

        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                headline,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    snapshot.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("   Level {}", snapshot.level),
                    Style::default().fg(Color::Gray),
                ),
            ]),
        ];

        if metrics.is_new_record() {
            text.push(Line::from(Span::styled(
                "New high score!",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )));
        }

        text.push(Line::from(""));
        text.extend(score_table_lines("High Scores", tables.local, tables.initials));
        if !tables.world.is_empty() {
            text.push(Line::from(""));
            let shown = &tables.world[..tables.world.len().min(5)];
            text.extend(score_table_lines("World", shown, tables.initials));
        }

        text.push(Line::from(""));
        text.push(Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::Gray)),
            Span::styled(
                "R",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to restart, ", Style::default().fg(Color::Gray)),
            Span::styled("1-4", Style::default().fg(Color::Cyan)),
            Span::styled(" to change mode or ", Style::default().fg(Color::Gray)),
            Span::styled(
                "Q",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to quit", Style::default().fg(Color::Gray)),
        ]));

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" to move | "),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("1-4", Style::default().fg(Color::Cyan)),
            Span::raw(" mode | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn score_table_lines(
    title: &'static str,
    entries: &[HighScoreEntry],
    initials: &str,
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        title,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::UNDERLINED),
    ))];

    if entries.is_empty() {
        lines.push(Line::from(Span::styled(
            "no scores yet",
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    }

    for (rank, entry) in entries.iter().enumerate() {
        let style = if entry.initials.as_str() == initials {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::White)
        };
        let country = entry.country.as_deref().unwrap_or("");
        lines.push(Line::from(Span::styled(
            format!("{:>2}. {:<3} {:>6} {:>2}", rank + 1, entry.initials, entry.score, country),
            style,
        )));
    }
    lines
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
