//! Ball physics
//!
//! Per-tick integration in pixels/tick, y-down. The ball is either active or
//! paused; while paused its velocity is zero and the pre-pause velocity is
//! kept for the bounce.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Settings;

/// Ball motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    Active,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Subtracted from `vel.y` every tick
    pub gravity: f32,
    pub restitution: f32,
    pub state: BallState,
    /// Velocity captured by the last `pause()`
    pub prev_vel: Vec2,
    /// Last trajectory from `project_path`, for drawing
    #[serde(skip)]
    pub projected_path: Vec<Vec2>,
}

impl Ball {
    pub fn new(settings: &Settings) -> Self {
        Self {
            pos: settings.initial_position,
            vel: settings.initial_velocity,
            radius: settings.ball_radius,
            gravity: settings.gravity,
            restitution: settings.restitution,
            state: BallState::Active,
            prev_vel: Vec2::ZERO,
            projected_path: Vec::new(),
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state == BallState::Paused
    }

    /// Advance one tick. No-op while paused.
    pub fn tick(&mut self) {
        if self.is_paused() {
            return;
        }
        let (pos, vel) = step(self.pos, self.vel, self.gravity);
        self.pos = pos;
        self.vel = vel;
    }

    /// Freeze the ball, remembering its velocity
    pub fn pause(&mut self) {
        if self.is_paused() {
            return;
        }
        self.prev_vel = self.vel;
        self.vel = Vec2::ZERO;
        self.state = BallState::Paused;
    }

    /// Unfreeze with the pre-pause velocity. Usually followed by `reflect`.
    pub fn resume(&mut self) {
        if !self.is_paused() {
            return;
        }
        self.vel = self.prev_vel;
        self.state = BallState::Active;
    }

    /// Bounce off a platform: replaces the velocity with the reflected
    /// pre-pause velocity. Call after `resume()`, before the next `tick()`.
    pub fn reflect(&mut self, platform_angle: f32, restitution: f32) {
        self.vel = reflect_velocity(self.prev_vel, platform_angle, restitution);
    }

    /// Simulate the bounce off a platform at `platform_angle` without touching
    /// live state. Returns one position per tick for
    /// `floor(total_duration / time_step)` ticks, identical to what `tick()`
    /// produces after `resume()` + `reflect()` with the same arguments.
    pub fn project_path(
        &self,
        platform_angle: f32,
        restitution: f32,
        gravity: f32,
        total_duration: f32,
        time_step: f32,
    ) -> Vec<Vec2> {
        // Durations are usually whole multiples of the tick, so absorb f32 noise
        // before flooring (0.7 / (1/30) must be 21 steps, not 20)
        let steps = if time_step > 0.0 && total_duration > 0.0 {
            (total_duration / time_step + 1e-4).floor() as usize
        } else {
            0
        };

        let mut pos = self.pos;
        let mut vel = reflect_velocity(self.prev_vel, platform_angle, restitution);
        let mut path = Vec::with_capacity(steps);
        for _ in 0..steps {
            (pos, vel) = step(pos, vel, gravity);
            path.push(pos);
        }
        path
    }

    /// `project_path` with this ball's own restitution and gravity, kept for drawing
    pub fn update_projection(&mut self, platform_angle: f32, total_duration: f32, time_step: f32) {
        self.projected_path = self.project_path(
            platform_angle,
            self.restitution,
            self.gravity,
            total_duration,
            time_step,
        );
    }
}

/// One integration step shared by the live ball and projections
#[inline]
fn step(pos: Vec2, vel: Vec2, gravity: f32) -> (Vec2, Vec2) {
    (pos + vel, Vec2::new(vel.x, vel.y - gravity))
}

/// Reflect a screen-space velocity off a platform at `platform_angle` degrees
/// and scale its speed by `restitution`.
pub fn reflect_velocity(vel: Vec2, platform_angle: f32, restitution: f32) -> Vec2 {
    let speed = vel.length() * restitution;
    let incoming = (-vel.y).atan2(vel.x);
    let reflection = 2.0 * platform_angle.to_radians() - incoming;
    Vec2::new(-speed * reflection.cos(), speed * reflection.sin())
}
