//! Bubble Bounce entry point
//!
//! Headless runner: loads a config, spawns bubbles, drives the simulator at a
//! fixed frame rate and prints the final bubble state as JSON.
//!
//! Usage: `bubble-bounce [config.json] [frames]`

#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use bubble_bounce::{BounceSimulator, SimConfig, SimError};

/// Frame delta fed to `advance` (60 Hz)
#[cfg(not(target_arch = "wasm32"))]
const FRAME_DT: f32 = 1.0 / 60.0;
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_FRAMES: u32 = 600;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    log::info!("Bubble Bounce (headless) starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No web surface; the library is driven by the host
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), SimError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load_from_file(path)?,
        None => {
            log::info!("No config given, using defaults");
            SimConfig::default()
        }
    };
    let frames = match args.next() {
        Some(arg) => arg.parse().unwrap_or_else(|_| {
            log::warn!("invalid frame count {arg:?}, using {DEFAULT_FRAMES}");
            DEFAULT_FRAMES
        }),
        None => DEFAULT_FRAMES,
    };

    let count = config.bubble_count;
    let mut sim = BounceSimulator::new(config)?;
    let spawned = sim.spawn_random(count);
    log::info!(
        "Spawned {} bubbles, running {} frames ({:.1}s)",
        spawned.len(),
        frames,
        frames as f32 * FRAME_DT
    );

    let mut iteration = 0;
    let mut bounces = 0;
    for _ in 0..frames {
        let report = sim.advance(FRAME_DT);
        if report.iteration != iteration {
            if iteration > 0 {
                log::info!("iteration {iteration}: {bounces} bounces");
            }
            iteration = report.iteration;
            bounces = 0;
        }
        bounces += report.bounces.len();
    }
    log::info!("iteration {iteration} (partial): {bounces} bounces");

    let snapshot = sim.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
