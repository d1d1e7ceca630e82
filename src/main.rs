//! Machine Revolution - headless runner
//!
//! Runs the simulation in real time on its own thread while an autopilot
//! thread plays the keyboard. Frames go to a recording presenter; HUD
//! changes and round results are logged.

use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::Sender;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use machine_revolution::GameConfig;
use machine_revolution::platform::{ChannelInput, InputSource, Pacer};
use machine_revolution::render::{RecordingPresenter, draw_frame};
use machine_revolution::settings::AimMode;
use machine_revolution::sim::{Phase, SimulationWorld, TickInput, tick};

#[derive(Parser, Debug)]
#[command(name = "machine-revolution")]
#[command(about = "Survive the ring while an AI turret learns to shoot ahead of you")]
struct Cli {
    /// JSON config file (defaults for anything missing)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Wall-clock seconds to run before quitting
    #[arg(long, default_value = "30")]
    seconds: f64,

    /// Override the world seed
    #[arg(long)]
    seed: Option<u64>,

    /// Aim straight at the player instead of using the predictor
    #[arg(long)]
    direct_aim: bool,

    /// Predictor checkpoint, loaded if present and saved on exit
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Outcome of a session
#[derive(Debug, Default)]
struct Summary {
    ticks: u64,
    rounds: u64,
    best_score: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.direct_aim {
        config.turret.aim_mode = AimMode::Direct;
    }
    if let Some(path) = &cli.checkpoint {
        config.predictor.load_checkpoint = path.exists();
        config.predictor.checkpoint_path = Some(path.clone());
        config.predictor.save_on_shutdown = true;
    }

    // The world validates on construction; this path never builds one
    if let Some(path) = &cli.write_config {
        config.validate()?;
        config.save(path)?;
        return Ok(());
    }

    log::info!("Machine Revolution starting (seed {})", config.seed);
    let world = SimulationWorld::new(config)?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let duration = Duration::from_secs_f64(cli.seconds.max(0.0));
    let seed = world.config().seed;
    let input_thread = thread::Builder::new()
        .name("autopilot".to_string())
        .spawn(move || autopilot(tx, duration, seed))?;
    let sim_thread = thread::Builder::new()
        .name("simulation".to_string())
        .spawn(move || run_simulation(world, ChannelInput::new(rx)))?;

    let summary = sim_thread
        .join()
        .map_err(|_| "simulation thread panicked")?;
    input_thread
        .join()
        .map_err(|_| "autopilot thread panicked")?;

    log::info!(
        "Session over: {} ticks, {} rounds, best score {}",
        summary.ticks,
        summary.rounds,
        summary.best_score
    );
    Ok(())
}

/// Tick loop. Owns the world; nothing else touches it.
fn run_simulation(mut world: SimulationWorld, mut input: ChannelInput) -> Summary {
    let mut pacer = Pacer::new(world.config().clock_rate);
    let mut presenter = RecordingPresenter::new(world.config().screen_size);
    let mut summary = Summary::default();
    let mut last_hud: Vec<String> = Vec::new();
    let mut last_phase = world.phase();

    while !world.is_closed() {
        for _ in 0..pacer.wait() {
            let keys = input.poll();
            tick(&mut world, &keys);
            summary.ticks += 1;

            let phase = world.phase();
            if phase != last_phase && phase == Phase::Dead {
                summary.rounds += 1;
                summary.best_score = summary.best_score.max(world.score());
            }
            last_phase = phase;
            if world.is_closed() {
                break;
            }
        }

        draw_frame(&world, &mut presenter);
        // Score text changes every few ticks in play; only log the rest
        if world.phase() != Phase::Play && presenter.texts != last_hud {
            log::info!("HUD: {}", presenter.texts.join(" | "));
            last_hud = presenter.texts.clone();
        }
    }
    summary
}

/// Plays the keyboard: starts rounds, restarts after losing and wiggles
/// around against gravity. Sends quit once `duration` has elapsed.
fn autopilot(tx: Sender<TickInput>, duration: Duration, seed: u64) {
    let mut rng = Pcg32::seed_from_u64(seed ^ 0xA070);
    let start = Instant::now();
    let frame = Duration::from_millis(16);
    let mut frame_index: u64 = 0;
    let mut horizontal = 0i8;

    while start.elapsed() < duration {
        if frame_index % 30 == 0 {
            horizontal = rng.random_range(-1..=1);
        }
        let keys = TickInput {
            // Short taps upward to fight gravity
            up: frame_index % 8 == 0,
            down: false,
            left: horizontal < 0,
            right: horizontal > 0,
            space: frame_index % 60 == 0,
            backspace: frame_index % 90 == 45,
            quit: false,
        };
        if tx.send(keys).is_err() {
            return;
        }
        frame_index += 1;
        thread::sleep(frame);
    }

    let _ = tx.send(TickInput {
        quit: true,
        ..Default::default()
    });
}
