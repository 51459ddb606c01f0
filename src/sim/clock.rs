//! Playback clock with pause accounting
//!
//! Song time is wall time minus every interval spent paused. The clock never
//! reads time itself; callers pass `now` from a `TimeSource`, which keeps it
//! deterministic under a frame-driven source.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Source of "now" in seconds
pub trait TimeSource {
    fn now(&self) -> f64;
}

/// Real time since construction
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Time that only moves when a frame is stepped
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    frame: u64,
    tick_rate: f64,
}

impl FrameClock {
    pub fn new(tick_rate: f32) -> Self {
        Self {
            frame: 0,
            tick_rate: tick_rate as f64,
        }
    }

    pub fn advance(&mut self) {
        self.frame += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl TimeSource for FrameClock {
    fn now(&self) -> f64 {
        self.frame as f64 / self.tick_rate
    }
}

/// Shared playback controls: pause/stop flags plus paused-time bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackClock {
    start_time: f64,
    total_paused_duration: f64,
    pause_start: Option<f64>,
    stopped: bool,
    /// Seconds from the current entry to the next one (0 when none is left)
    pub time_until_next: f64,
}

impl PlaybackClock {
    pub fn new(start_time: f64) -> Self {
        Self {
            start_time,
            ..Default::default()
        }
    }

    /// Song time at `now`, excluding paused intervals. Frozen while paused.
    pub fn elapsed(&self, now: f64) -> f64 {
        let now = self.pause_start.unwrap_or(now);
        now - self.start_time - self.total_paused_duration
    }

    pub fn is_paused(&self) -> bool {
        self.pause_start.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn total_paused_duration(&self) -> f64 {
        self.total_paused_duration
    }

    /// Start a pause. Ignored if already paused.
    pub fn pause(&mut self, now: f64) {
        if self.pause_start.is_none() {
            self.pause_start = Some(now);
        }
    }

    /// End a pause, committing its length. Returns the interval added.
    pub fn resume(&mut self, now: f64) -> f64 {
        match self.pause_start.take() {
            Some(started) => {
                let delta = (now - started).max(0.0);
                self.total_paused_duration += delta;
                delta
            }
            None => 0.0,
        }
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Is an entry scheduled at `event_time` due?
    pub fn is_due(&self, event_time: f64, now: f64) -> bool {
        !self.is_paused() && self.elapsed(now) >= event_time
    }
}
