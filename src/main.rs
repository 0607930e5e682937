use std::cell::Cell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use grid_snake::config::GameConfig;
use grid_snake::events::{EventKind, GameEvent};
use grid_snake::game::{GameEngine, LifeState};
use grid_snake::input::MoveScript;
use grid_snake::orchestrator::Orchestrator;
use grid_snake::scheduler::TickScheduler;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

/// Replays a move script against the snake rules engine and prints every
/// game event.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML). Defaults to the per-user config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width in cells.
    #[arg(long)]
    width: Option<u16>,

    /// Grid height in cells.
    #[arg(long)]
    height: Option<u16>,

    /// Milliseconds between ticks.
    #[arg(long = "interval-ms")]
    interval_ms: Option<u64>,

    /// Seed for apple placement.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print events as JSON lines instead of text.
    #[arg(long)]
    json: bool,

    /// Number of ticks to run; defaults to the script length.
    #[arg(long = "max-ticks")]
    max_ticks: Option<usize>,

    /// One step per tick: U/D/L/R (or N/S/W/E) to turn, `.` to keep going.
    moves: MoveScript,
}

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    tick: usize,
    #[serde(flatten)]
    event: &'a GameEvent,
}

#[derive(Debug, Serialize)]
struct Summary {
    ticks: usize,
    score: u32,
    length: usize,
    state: LifeState,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    run(&cli, config)
}

fn load_config(cli: &Cli) -> anyhow::Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path, false)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match GameConfig::default_path() {
            Ok(path) => GameConfig::load(&path, true)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            Err(error) => {
                log::warn!("{error}; using default settings");
                GameConfig::default()
            }
        },
    };

    if let Some(width) = cli.width {
        config.grid.width = width;
    }
    if let Some(height) = cli.height {
        config.grid.height = height;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.tick_interval = Duration::from_millis(interval_ms);
    }

    config.validate().context("invalid game settings")
}

fn run(cli: &Cli, config: GameConfig) -> anyhow::Result<()> {
    let tick = Rc::new(Cell::new(0usize));
    let mut engine = GameEngine::new(config.grid);
    for kind in EventKind::iter() {
        let tick = Rc::clone(&tick);
        let json = cli.json;
        engine.on(kind, move |event| {
            if let Err(error) = print_event(tick.get(), event, json) {
                log::warn!("Failed to print event: {error}");
            }
        });
    }

    let mut orchestrator =
        Orchestrator::new(&config, StdRng::seed_from_u64(cli.seed), &mut engine);

    let max_ticks = cli.max_ticks.unwrap_or(cli.moves.len());
    let mut scheduler = TickScheduler::new(config.tick_interval, Instant::now());
    let mut ticks = 0;

    while ticks < max_ticks {
        let now = Instant::now();
        if !scheduler.is_due(now) {
            thread::sleep(scheduler.time_until_due(now));
            continue;
        }

        ticks += 1;
        tick.set(ticks);
        if let Some(Some(direction)) = cli.moves.step(ticks - 1) {
            orchestrator.handle_direction(&mut engine, direction);
        }
        orchestrator.tick(&mut engine);

        if orchestrator.is_failed() && !cli.moves.has_direction_from(ticks) {
            log::info!("Snake crashed with no further input, stopping");
            break;
        }
    }
    scheduler.cancel();

    let summary = Summary {
        ticks,
        score: engine.score(),
        length: engine.snake().len(),
        state: engine.life_state(),
    };
    print_summary(&summary, cli.json).context("failed to write summary")
}

fn print_event(tick: usize, event: &GameEvent, json: bool) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    if json {
        let line = serde_json::to_string(&EventRecord { tick, event })?;
        writeln!(stdout, "{line}")?;
    } else {
        writeln!(stdout, "[tick {tick:>4}] {event}")?;
    }
    Ok(())
}

fn print_summary(summary: &Summary, json: bool) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    if json {
        let line = serde_json::to_string(summary)?;
        writeln!(stdout, "{line}")?;
    } else {
        writeln!(
            stdout,
            "{} ticks, score {}, length {}, {:?}",
            summary.ticks, summary.score, summary.length, summary.state
        )?;
    }
    Ok(())
}
