//! Bounce Builder entry point
//!
//! Runs headless build episodes over a MIDI file with a seeded random agent.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use bounce_builder::Settings;
use bounce_builder::agent::{BuilderEnv, RandomAgent, run_episode};

/// Build bounce paths for a song, one platform per note.
#[derive(Debug, Parser)]
#[command(name = "bounce-builder", version)]
struct Args {
    /// MIDI file to build against
    #[arg(value_name = "MIDI")]
    midi: PathBuf,

    /// Settings file (JSON). Defaults are used for missing fields.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of episodes to run
    #[arg(short, long, default_value = "1", value_name = "N")]
    episodes: u32,

    /// Seed for the random agent; episode i uses seed + i
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Save the best episode's frames and platforms here (JSON)
    #[arg(short, long, value_name = "FILE")]
    record: Option<PathBuf>,

    /// Give up on an episode after this many frames
    #[arg(long, default_value = "100000", value_name = "N")]
    max_steps: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let mut env = BuilderEnv::from_midi(&args.midi, settings)
        .with_context(|| format!("reading {}", args.midi.display()))?;
    log::info!(
        "Bounce Builder: {} timeline entries in {}",
        env.remaining(),
        args.midi.display()
    );

    let mut best = None;
    for i in 0..args.episodes {
        let mut agent = RandomAgent::new(args.seed.wrapping_add(i as u64));
        let episode = run_episode(&mut env, &mut agent, args.max_steps);
        log::info!(
            "Episode {i}: {} platforms, reward {:.2}, {} in {} steps",
            episode.platforms,
            episode.reward,
            if episode.completed { "completed" } else { "stuck" },
            episode.steps
        );
        if best.as_ref().is_none_or(|(r, _)| episode.reward > *r) {
            best = Some((episode.reward, env.record()));
        }
    }

    if let (Some(path), Some((reward, record))) = (&args.record, &best) {
        record
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Best reward {reward:.2} saved to {}", path.display());
    }

    Ok(())
}
