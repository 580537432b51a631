//! Horde Arena headless runner
//!
//! Plays an encounter with the autopilot at a simulated 60 fps and logs
//! progress. `RUST_LOG=info` (or `debug`) controls verbosity.
//!
//! Usage: `horde-arena [--config PATH] [--seed N] [--seconds N]`

use std::process::ExitCode;

use horde_arena::sim::{Encounter, GameEvent, TickInput};
use horde_arena::{EncounterConfig, HudSnapshot};

const FRAME_DT: f32 = 1.0 / 60.0;

struct Args {
    config: Option<String>,
    seed: Option<u64>,
    seconds: f32,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        seed: None,
        seconds: 120.0,
    };
    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        let mut value = || it.next().ok_or_else(|| format!("{flag} needs a value"));
        match flag.as_str() {
            "--config" => args.config = Some(value()?),
            "--seed" => {
                let v = value()?;
                args.seed = Some(v.parse().map_err(|_| format!("bad seed '{v}'"))?);
            }
            "--seconds" => {
                let v = value()?;
                args.seconds = v.parse().map_err(|_| format!("bad duration '{v}'"))?;
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(args)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::from(2);
        }
    };

    let mut config = match &args.config {
        Some(path) => match EncounterConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => EncounterConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    log::info!("Horde Arena starting (seed {})", config.seed);
    let mut encounter = Encounter::new(&config);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let frames = (args.seconds.max(0.0) / FRAME_DT).ceil() as u64;
    for frame in 0..frames {
        encounter.advance(&input, FRAME_DT);

        for event in encounter.drain_events() {
            match event {
                GameEvent::WaveStarted { wave, count } => {
                    log::info!("Wave {wave}: {count} enemies");
                }
                GameEvent::UpgradeApplied { id } => log::info!("Took upgrade {id}"),
                GameEvent::PlayerDied => log::info!("Player died"),
                other => log::debug!("{other:?}"),
            }
        }

        if frame % 300 == 0 {
            log::info!("{}", HudSnapshot::capture(&encounter).summary());
        }
        if encounter.is_over() {
            break;
        }
    }

    let hud = HudSnapshot::capture(&encounter);
    match serde_json::to_string_pretty(&hud) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("Could not serialize HUD snapshot: {e}"),
    }
    ExitCode::SUCCESS
}
