//! Bounce platform geometry
//!
//! A platform is a rectangle sitting just outside the ball: its face is
//! `offset` (the ball radius) away from the anchor along the platform's
//! heading, `length` wide along the face and `width` thick away from the ball.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::disk_touches_polygon;
use crate::{Settings, heading, normalize_degrees};

/// Which anchor to build the polygon from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Follow the ball's current position (the platform still being aimed)
    Live(Vec2),
    /// The position captured when the platform was created
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// Ball position when the platform was created (world space)
    pub anchor: Vec2,
    /// Degrees in [0, 360)
    angle: f32,
    pub length: f32,
    pub width: f32,
    /// Gap between anchor and face
    pub offset: f32,
    /// Screen-space polygon as of the last `recompute_vertices`
    #[serde(skip)]
    vertices: [Vec2; 4],
}

impl Platform {
    pub fn new(anchor: Vec2, settings: &Settings) -> Self {
        let mut platform = Self {
            anchor,
            angle: 0.0,
            length: settings.platform_length,
            width: settings.platform_width,
            offset: settings.ball_radius,
            vertices: [Vec2::ZERO; 4],
        };
        platform.recompute_vertices(Anchor::Fixed, 0.0);
        platform
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Set the angle (normalized to [0, 360)).
    /// Vertices are stale until the next `recompute_vertices`.
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = normalize_degrees(angle);
    }

    /// Rebuild the polygon in screen space (`y - vertical_offset`)
    pub fn recompute_vertices(&mut self, anchor: Anchor, vertical_offset: f32) {
        let origin = match anchor {
            Anchor::Live(pos) => pos,
            Anchor::Fixed => self.anchor,
        };
        let mut verts = polygon(origin, self.angle, self.length, self.width, self.offset);
        for v in &mut verts {
            v.y -= vertical_offset;
        }
        self.vertices = verts;
    }

    pub fn vertices(&self) -> &[Vec2; 4] {
        &self.vertices
    }

    /// Does a disk at `point` (screen space) touch this platform?
    pub fn check_collision(&self, point: Vec2, radius: f32) -> bool {
        disk_touches_polygon(point, radius, &self.vertices)
    }
}

/// World-space corners of a platform anchored at `origin`
pub fn polygon(origin: Vec2, angle: f32, length: f32, width: f32, offset: f32) -> [Vec2; 4] {
    let dir = heading(angle);
    let face = origin + dir * offset;
    let back = face + dir * width;

    let rad = (angle + 90.0).to_radians();
    let half = Vec2::new(rad.cos(), rad.sin()) * (length / 2.0);

    [
        Vec2::new(face.x - half.x, face.y + half.y),
        Vec2::new(face.x + half.x, face.y - half.y),
        Vec2::new(back.x + half.x, back.y - half.y),
        Vec2::new(back.x - half.x, back.y + half.y),
    ]
}
