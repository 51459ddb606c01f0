//! Bounce Builder - a MIDI-driven platform builder
//!
//! A ball falls under gravity. Every note in the song pauses time, the player
//! (or an agent) aims a platform, and resuming bounces the ball off it.
//!
//! Core modules:
//! - `timeline`: MIDI tempo map to absolute-time event queue
//! - `sim`: Deterministic simulation (ball, platforms, collisions, action mask, game phases)
//! - `playback`: Timeline worker thread and shared pause accounting
//! - `agent`: Automated-agent environment over the same simulation
//! - `app`: Interactive frame loop wiring the collaborators together
//! - `audio`, `renderer`, `input`: Narrow collaborator interfaces

pub mod agent;
pub mod app;
pub mod audio;
pub mod error;
pub mod input;
pub mod playback;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod timeline;

pub use error::{Error, Result};
pub use settings::Settings;

use glam::Vec2;

/// Fixed values that are part of the game's rules rather than its tuning
pub mod consts {
    /// Number of discrete platform angles (one per degree)
    pub const ANGLE_CHOICES: usize = 360;
    /// Platforms reported in an agent observation
    pub const OBSERVED_PLATFORMS: usize = 25;
    /// MIDI default tempo: 500,000 microseconds per beat (120 bpm)
    pub const DEFAULT_TEMPO_US: u32 = 500_000;
    /// Longest the playback worker sleeps between checks (seconds)
    pub const WORKER_POLL_SECS: f64 = 0.01;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Screen-space unit heading for an angle in degrees.
///
/// Angles are counter-clockwise in y-up math space, screen space is y-down,
/// so the y component is negated.
#[inline]
pub fn heading(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), -rad.sin())
}
