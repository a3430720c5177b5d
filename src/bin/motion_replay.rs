//! Replay an alignment file through the avatar engine and print one JSON
//! frame per line.
//!
//! Usage: motion-replay <alignment.json> [motion_config.json]

use anyhow::{Context, Result};
use kokoro_avatar_motion::config::load_config;
use kokoro_avatar_motion::lipsync::Alignment;
use kokoro_avatar_motion::{AvatarEngine, TickInput};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const FRAME_RATE: f64 = 60.0;
/// Frames rendered after the last character so the mouth can settle.
const TAIL_SECS: f64 = 0.5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let alignment_path: PathBuf = args
        .next()
        .context("usage: motion-replay <alignment.json> [motion_config.json]")?
        .into();
    let config = args
        .next()
        .map(|p| load_config(&PathBuf::from(p)))
        .unwrap_or_default();

    let alignment = Alignment::load(&alignment_path)
        .with_context(|| format!("failed to read alignment {}", alignment_path.display()))?;

    let mut engine = AvatarEngine::seeded(config, 0);
    engine.start_utterance(Some(&alignment));

    let speech = alignment.total_duration() as f64;
    let total = speech + TAIL_SECS;
    let frames = (total * FRAME_RATE).ceil() as usize;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for i in 0..frames {
        let now = i as f64 / FRAME_RATE;
        let frame = engine.tick(TickInput {
            playback_time: now as f32,
            // no audio in a replay; a steady level keeps the avatar speaking
            amplitude: if now < speech { 40.0 } else { 0.0 },
            is_playing: now < speech,
            now,
        });
        serde_json::to_writer(&mut out, &frame)?;
        writeln!(out)?;
    }
    engine.stop();
    Ok(())
}
