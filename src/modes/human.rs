use std::io::{Stderr, stderr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval, interval_at};

use crate::game::{GameConfig, GameEngine, GameMode, GameSession, TickOutcome};
use crate::input::{InputHandler, KeyAction};
use crate::leaderboard::{Leaderboard, OfflineLeaderboard, SubmitReceipt};
use crate::metrics::GameMetrics;
use crate::persistence::{self, HighScoreEntry, Initials, SETTING_MODE, ScoreStore};
use crate::render::{Renderer, ScoreTables};

/// Results coming back from storage and leaderboard tasks
#[derive(Debug)]
pub enum AdapterReport {
    LocalScores(Result<Vec<HighScoreEntry>>),
    WorldScores(Result<Vec<HighScoreEntry>>),
    WorldSubmit(Result<SubmitReceipt>),
    SettingSaved { key: &'static str, result: Result<()> },
}

/// Interactive terminal session
pub struct HumanMode<L = OfflineLeaderboard> {
    engine: GameEngine,
    session: GameSession,
    mode: GameMode,
    initials: Initials,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    store: Arc<dyn ScoreStore>,
    leaderboard: L,
    local_scores: Vec<HighScoreEntry>,
    world_scores: Vec<HighScoreEntry>,
    reports_tx: mpsc::UnboundedSender<AdapterReport>,
    reports_rx: mpsc::UnboundedReceiver<AdapterReport>,
    /// Set when the tick timer must pick up a new interval
    reschedule_tick: bool,
    should_quit: bool,
}

impl<L> HumanMode<L>
where
    L: Leaderboard + Clone + 'static,
{
    pub fn new(
        config: GameConfig,
        mode: GameMode,
        initials: Initials,
        store: Arc<dyn ScoreStore>,
        leaderboard: L,
    ) -> Self {
        let mut engine = GameEngine::new(config);
        let session = engine.new_session(mode);
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        Self {
            engine,
            session,
            mode,
            initials,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            store,
            leaderboard,
            local_scores: Vec::new(),
            world_scores: Vec::new(),
            reports_tx,
            reports_rx,
            reschedule_tick: false,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.load_tables();

        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut tick_timer = new_tick_timer(self.session.tick_interval);

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    self.update_game();
                }

                // Storage and leaderboard results
                Some(report) = self.reports_rx.recv() => {
                    self.apply_report(report);
                }

                // Render frame
                _ = render_timer.tick() => {
                    let snapshot = self.session.snapshot();
                    let tables = ScoreTables {
                        initials: self.initials.as_str(),
                        local: &self.local_scores,
                        world: &self.world_scores,
                    };
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &snapshot, &self.metrics, tables);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }

            // Level-ups, speed effects and restarts all change the pace
            if std::mem::take(&mut self.reschedule_tick) {
                tracing::debug!(interval = ?self.session.tick_interval, "rescheduling tick timer");
                tick_timer = new_tick_timer(self.session.tick_interval);
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::GameAction(action) => {
                    self.engine.handle_action(&mut self.session, action);
                }
                KeyAction::SelectMode(mode) => {
                    self.select_mode(mode);
                }
                KeyAction::Restart => {
                    self.reset_game();
                }
                KeyAction::Quit => {
                    self.should_quit = true;
                }
                KeyAction::None => {}
            }
        }
    }

    fn update_game(&mut self) {
        let result = self.engine.tick(&mut self.session);
        for event in &result.events {
            tracing::trace!(?event, "game event");
        }
        self.reschedule_tick |= result.interval_changed;

        if let TickOutcome::GameOver(_) = result.outcome {
            self.metrics.on_game_over(self.session.score, self.session.level);
            self.submit_scores();
        }
    }

    fn reset_game(&mut self) {
        self.session = self.engine.new_session(self.mode);
        self.metrics.on_game_start();
        self.reschedule_tick = true;
    }

    fn select_mode(&mut self, mode: GameMode) {
        self.mode = mode;
        self.reset_game();

        let store = Arc::clone(&self.store);
        let tx = self.reports_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = store.save_setting(SETTING_MODE, mode.as_str());
            let _ = tx.send(AdapterReport::SettingSaved {
                key: SETTING_MODE,
                result,
            });
        });
    }

    /// Kick off loading of the local and world tables
    fn load_tables(&self) {
        let store = Arc::clone(&self.store);
        let tx = self.reports_tx.clone();
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(AdapterReport::LocalScores(store.load_high_scores()));
        });

        let leaderboard = self.leaderboard.clone();
        let tx = self.reports_tx.clone();
        tokio::spawn(async move {
            let scores = leaderboard.fetch_world_scores().await;
            let _ = tx.send(AdapterReport::WorldScores(scores));
        });
    }

    /// Record the finished session locally and on the world leaderboard
    fn submit_scores(&self) {
        if self.session.score == 0 {
            return;
        }
        let entry = HighScoreEntry::new(self.initials.clone(), self.session.score, self.mode);

        let store = Arc::clone(&self.store);
        let tx = self.reports_tx.clone();
        let local_entry = entry.clone();
        tokio::task::spawn_blocking(move || {
            let table = persistence::submit_score(store.as_ref(), local_entry);
            let _ = tx.send(AdapterReport::LocalScores(table));
        });

        let leaderboard = self.leaderboard.clone();
        let tx = self.reports_tx.clone();
        tokio::spawn(async move {
            let receipt = leaderboard.submit_world_score(entry).await;
            let _ = tx.send(AdapterReport::WorldSubmit(receipt));
            let scores = leaderboard.fetch_world_scores().await;
            let _ = tx.send(AdapterReport::WorldScores(scores));
        });
    }

    fn apply_report(&mut self, report: AdapterReport) {
        match report {
            AdapterReport::LocalScores(Ok(table)) => {
                if let Some(best) = table.first() {
                    self.metrics.merge_high_score(best.score);
                }
                self.local_scores = table;
            }
            AdapterReport::LocalScores(Err(e)) => {
                tracing::warn!("high score storage failed: {e:#}");
            }
            AdapterReport::WorldScores(Ok(table)) => {
                self.world_scores = table;
            }
            AdapterReport::WorldScores(Err(e)) => {
                tracing::warn!("world scores unavailable: {e:#}");
            }
            AdapterReport::WorldSubmit(Ok(receipt)) if receipt.success => {
                tracing::info!(message = %receipt.message, "world score submitted");
            }
            AdapterReport::WorldSubmit(Ok(receipt)) => {
                tracing::warn!(message = %receipt.message, "world score rejected");
            }
            AdapterReport::WorldSubmit(Err(e)) => {
                tracing::warn!("world score submission failed: {e:#}");
            }
            AdapterReport::SettingSaved { key, result: Err(e) } => {
                tracing::warn!("failed to save setting {key}: {e:#}");
            }
            AdapterReport::SettingSaved { .. } => {}
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

/// Timer whose first beat is one full period away
fn new_tick_timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}
