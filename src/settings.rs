//! Simulation settings
//!
//! Every tunable constant lives here and is passed into each component at
//! construction. Persisted as JSON.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Screen ===
    /// Screen width in pixels
    pub screen_width: f32,
    /// Screen height in pixels
    pub screen_height: f32,
    /// Screen row the camera keeps the ball on
    pub camera_center: f32,
    /// Placements whose path comes within this many pixels of a side edge are rejected
    pub edge_margin: f32,

    // === Ball ===
    /// Spawn position
    pub initial_position: Vec2,
    /// Spawn velocity (pixels per tick)
    pub initial_velocity: Vec2,
    pub ball_radius: f32,
    /// Subtracted from vy every tick (negative = falls down the screen)
    pub gravity: f32,
    /// Fraction of speed kept after a bounce, in (0, 1]
    pub restitution: f32,

    // === Timing ===
    /// Simulation ticks per second
    pub tick_rate: f32,
    /// Free fall before the timeline starts (seconds)
    pub initial_fall_secs: f32,
    /// Notes closer than this (seconds) are merged into one timeline entry
    pub grouping_tolerance: f64,

    // === Platforms ===
    /// Extent along the platform face
    pub platform_length: f32,
    /// Thickness away from the ball
    pub platform_width: f32,

    // === Audio ===
    /// Backing track looped while building
    pub audio_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: 800.0,
            screen_height: 600.0,
            camera_center: 200.0,
            edge_margin: 5.0,

            initial_position: Vec2::new(400.0, 100.0),
            initial_velocity: Vec2::ZERO,
            ball_radius: 15.0,
            gravity: -0.3,
            restitution: 0.8,

            tick_rate: 30.0,
            initial_fall_secs: 0.5,
            grouping_tolerance: 0.01,

            platform_length: 50.0,
            platform_width: 10.0,

            audio_path: None,
        }
    }
}

impl Settings {
    /// Seconds per simulation tick
    #[inline]
    pub fn time_step(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// Number of ticks the opening free fall lasts
    pub fn initial_fall_ticks(&self) -> u32 {
        (self.initial_fall_secs * self.tick_rate).round().max(0.0) as u32
    }

    /// Camera transform: world y minus this gives screen y
    #[inline]
    pub fn vertical_offset(&self, ball_y: f32) -> f32 {
        ball_y - self.camera_center
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("screen_width", self.screen_width),
            ("screen_height", self.screen_height),
            ("ball_radius", self.ball_radius),
            ("tick_rate", self.tick_rate),
            ("platform_length", self.platform_length),
            ("platform_width", self.platform_width),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidSettings(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.restitution > 0.0 && self.restitution <= 1.0) {
            return Err(Error::InvalidSettings(format!(
                "restitution must be in (0, 1], got {}",
                self.restitution
            )));
        }
        if !(self.initial_fall_secs.is_finite() && self.initial_fall_secs >= 0.0) {
            return Err(Error::InvalidSettings(format!(
                "initial_fall_secs must not be negative, got {}",
                self.initial_fall_secs
            )));
        }
        if !(self.grouping_tolerance.is_finite() && self.grouping_tolerance >= 0.0) {
            return Err(Error::InvalidSettings(format!(
                "grouping_tolerance must not be negative, got {}",
                self.grouping_tolerance
            )));
        }
        if !(self.edge_margin.is_finite() && self.gravity.is_finite()) {
            return Err(Error::InvalidSettings("edge_margin and gravity must be finite".into()));
        }
        Ok(())
    }

    /// Load settings from a JSON file. Invalid values are an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
