mod app;
mod config;
mod game;
mod geometry;
mod scores;
mod snake;
mod term;
mod timer;

use std::{fs::{self, File}, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use log::{info, LevelFilter};
use rand::{rngs::StdRng, SeedableRng};
use simplelog::{Config, WriteLogger};

use app::App;
use config::GameConfig;
use game::Game;
use scores::{ScoreTable, DEFAULT_CAPACITY};
use term::TermManager;

pub type TermInt = u16;
pub type Coords = (u16, u16);

const LOG_FILE: &str = "pathsnake.log";

fn main() -> Result<()> {
    // The terminal belongs to the game, so everything is logged to a file
    WriteLogger::init(LevelFilter::Debug, Config::default(), File::create(log_path())?)
        .context("failed to initialise the logger")?;
    info!("Starting {}", env!("CARGO_PKG_NAME"));

    let term = TermManager::new()?;
    let (cols, rows) = term.get_terminal_size();
    let config = GameConfig::for_terminal(cols, rows)
        .with_context(|| format!("terminal of {}x{} cannot fit the game", cols, rows))?;

    let scores = match ScoreTable::default_path() {
        Some(path) => ScoreTable::load(path, DEFAULT_CAPACITY),
        None => ScoreTable::in_memory(DEFAULT_CAPACITY),
    };
    info!("{} high scores on the table", scores.len());

    let game = Game::new(config, scores, StdRng::from_entropy(), Instant::now());
    App::new(term, game).run()
}

fn log_path() -> PathBuf {
    let path = ScoreTable::default_path()
        .and_then(|p| p.parent().map(|dir| dir.join(LOG_FILE)))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE));

    if let Some(dir) = path.parent() {
        // Falls back to the working directory below if this fails
        if fs::create_dir_all(dir).is_err() {
            return PathBuf::from(LOG_FILE);
        }
    }

    path
}
