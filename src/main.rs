use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use snake_arcade::game::{GameConfig, GameMode};
use snake_arcade::leaderboard::OfflineLeaderboard;
use snake_arcade::modes::HumanMode;
use snake_arcade::persistence::{
    Initials, JsonFileStore, SETTING_INITIALS, SETTING_MODE, ScoreStore,
};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(name = "snake_arcade")]
#[command(version, about = "Snake arcade for the terminal: classic, maze, time trial and battle")]
struct Cli {
    /// Game mode (defaults to the last mode played)
    #[arg(long)]
    mode: Option<Mode>,

    /// Grid width
    #[arg(long)]
    width: Option<usize>,

    /// Grid height
    #[arg(long)]
    height: Option<usize>,

    /// Starting speed from 1 (150 ms per move) to 3 (90 ms per move)
    #[arg(long)]
    speed: Option<u8>,

    /// Fixed RNG seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for high scores and settings
    #[arg(long, default_value = ".snake_arcade")]
    data_dir: PathBuf,

    /// Log file (the terminal is taken by the game)
    #[arg(long, default_value = "snake_arcade.log")]
    log_file: PathBuf,

    /// Player initials, saved for later sessions
    #[arg(long)]
    initials: Option<String>,

    /// Two-letter country code attached to leaderboard submissions
    #[arg(long)]
    country: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Eat, grow, avoid walls and yourself
    Classic,
    /// Obstacles that rearrange on every level
    Maze,
    /// Score as much as possible in 60 seconds
    #[value(alias = "time-trial")]
    Time,
    /// Race a computer-controlled snake for the food
    Battle,
}

impl From<Mode> for GameMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Classic => GameMode::Classic,
            Mode::Maze => GameMode::Maze,
            Mode::Time => GameMode::TimeTrial,
            Mode::Battle => GameMode::Battle,
        }
    }
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn build_config(cli: &Cli) -> Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(width) = cli.width {
        config.grid_width = width;
    }
    if let Some(height) = cli.height {
        config.grid_height = height;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(speed) = cli.speed {
        config
            .set_starting_speed(speed)
            .context("Invalid starting speed")?;
    }
    config.validate().context("Invalid game configuration")?;
    Ok(config)
}

fn resolve_initials(cli: &Cli, store: &dyn ScoreStore) -> Result<Initials> {
    if let Some(raw) = &cli.initials {
        let Some(initials) = Initials::parse(raw) else {
            bail!("initials must contain at least one letter or digit: {raw:?}");
        };
        if let Err(e) = store.save_setting(SETTING_INITIALS, initials.as_str()) {
            tracing::warn!("failed to save initials: {e:#}");
        }
        return Ok(initials);
    }

    let stored = store.setting_or(SETTING_INITIALS, "");
    Ok(Initials::parse(&stored).unwrap_or_default())
}

fn resolve_mode(cli: &Cli, store: &dyn ScoreStore) -> GameMode {
    match cli.mode {
        Some(mode) => mode.into(),
        None => store
            .setting_or(SETTING_MODE, GameMode::default().as_str())
            .parse()
            .unwrap_or_default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let config = build_config(&cli)?;
    let store = Arc::new(JsonFileStore::new(&cli.data_dir));
    let initials = resolve_initials(&cli, store.as_ref())?;
    let mode = resolve_mode(&cli, store.as_ref());
    tracing::info!(%mode, %initials, data_dir = ?store.dir(), "starting");

    let leaderboard = OfflineLeaderboard::new(cli.country.clone());
    let mut human_mode = HumanMode::new(config, mode, initials, store, leaderboard);
    human_mode.run().await?;

    Ok(())
}
