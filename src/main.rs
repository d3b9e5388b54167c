//! Heartbeat Devil - headless runner
//!
//! Plays the simulation with a scripted autopilot, optionally fed by a live
//! heart rate over UDP. Useful for soak-testing stages and the bpm link
//! without a renderer.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use heartbeat_devil::biometric::{BpmListener, BpmSlot};
use heartbeat_devil::sim::{GameEvent, GameState, PlayerInput, TickInput, tick};
use heartbeat_devil::snapshot::RenderSnapshot;
use heartbeat_devil::{LevelError, Settings, SettingsError};

/// Longest frame fed to the simulation in realtime mode
const MAX_FRAME_DT: f32 = 0.05;
/// Autopilot jump rhythm
const JUMP_PERIOD: f32 = 0.7;
const JUMP_HOLD: f32 = 0.1;

#[derive(Parser, Debug)]
#[command(name = "heartbeat-devil")]
#[command(author, version, about = "Headless runner for the Heartbeat Devil simulation", long_about = None)]
struct Cli {
    /// Settings file (JSON); flags below override it
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Resting heart rate in bpm
    #[arg(long, value_parser = clap::value_parser!(i32).range(40..=200))]
    baseline: Option<i32>,

    /// Run seed
    #[arg(long)]
    seed: Option<u64>,

    /// Stage to start on
    #[arg(long)]
    level: Option<u32>,

    /// Simulated seconds to run for
    #[arg(long, default_value_t = 30.0)]
    seconds: f32,

    /// Receive live bpm on this UDP address (e.g. 0.0.0.0:5005)
    #[arg(long)]
    listen: Option<String>,

    /// Pace frames with the wall clock and feed the measured frame time
    #[arg(long)]
    realtime: bool,

    /// Print the final render snapshot as JSON
    #[arg(long)]
    snapshot: bool,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("bpm listener: {0}")]
    Listener(#[from] std::io::Error),
    #[error("snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Scripted input: run right, hop on a fixed rhythm, burn flash charges
#[derive(Debug, Default)]
struct Autopilot {
    clock: f32,
}

impl Autopilot {
    fn next(&mut self, state: &GameState, dt: f32) -> TickInput {
        self.clock += dt;
        let jump = self.clock % JUMP_PERIOD < JUMP_HOLD;
        TickInput {
            player: PlayerInput {
                right: true,
                jump,
                // jump may be swapped onto the down key
                down: jump && state.player.is_jump_swapped(),
                flash: state.player.flash_charges > 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, AppError> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(baseline) = cli.baseline {
        settings.baseline_bpm = baseline;
    }
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if let Some(level) = cli.level {
        settings.start_level = level;
    }
    if cli.listen.is_some() {
        settings.bpm_listen = cli.listen.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let layouts = settings.layouts()?;
    let mut state = GameState::with_layouts(
        settings.baseline_bpm,
        settings.seed,
        settings.start_level,
        &layouts,
    )?;

    let slot = BpmSlot::new();
    let _listener = match &settings.bpm_listen {
        Some(addr) => Some(BpmListener::spawn(addr.as_str(), slot.clone())?),
        None => None,
    };

    let step = settings.frame_dt();
    let frames = (cli.seconds.max(0.0) / step).ceil() as u64;
    let mut autopilot = Autopilot::default();
    let mut clears = 0u32;
    let mut last = Instant::now();

    for _ in 0..frames {
        let dt = if cli.realtime {
            let target = Duration::from_secs_f32(step);
            let elapsed = last.elapsed();
            if elapsed < target {
                thread::sleep(target - elapsed);
            }
            let now = Instant::now();
            let dt = (now - last).as_secs_f32().min(MAX_FRAME_DT);
            last = now;
            dt
        } else {
            step
        };

        let input = autopilot.next(&state, dt);
        for event in tick(&mut state, &input, dt, slot.latest()) {
            if let GameEvent::LevelCleared { .. } = event {
                clears += 1;
            }
        }
        if state.finished {
            break;
        }
    }

    log::info!(
        "Stopped after {} ticks: stage {}/{}, {} cleared, {} deaths, {} bpm ({})",
        state.time_ticks,
        state.stage,
        state.stage_count(),
        clears,
        state.deaths,
        state.hr.bpm(),
        state.mode().as_str()
    );

    if cli.snapshot {
        println!("{}", RenderSnapshot::capture(&state).to_json()?);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Heartbeat Devil (headless) starting...");

    if let Err(e) = run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
