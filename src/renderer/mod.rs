//! Rendering collaborator
//!
//! The core hands screen-space shapes (already shifted by the camera offset)
//! to a `Canvas`. Backends draw them; `RecordingCanvas` keeps them for tests
//! and headless runs.

pub mod shapes;

use glam::Vec2;

pub use shapes::draw_game;

/// RGBA, each channel in [0, 1]
pub type Color = [f32; 4];

pub const BACKGROUND: Color = [0.0, 0.0, 0.0, 1.0];
pub const BALL_OUTLINE: Color = [1.0, 0.0, 0.0, 1.0];
pub const BALL_FILL: Color = [1.0, 1.0, 1.0, 1.0];
pub const PLATFORM: Color = [1.0, 1.0, 1.0, 1.0];
/// Platform already passed during a replay
pub const PLATFORM_LIT: Color = [1.0, 0.85, 0.2, 1.0];
/// Projected path when the aimed angle is legal
pub const VALID: Color = [0.0, 1.0, 0.0, 0.35];
/// Projected path when it is not
pub const INVALID: Color = [1.0, 0.0, 0.0, 0.35];

/// Drawing surface
pub trait Canvas {
    fn clear(&mut self, color: Color);
    fn draw_disk(&mut self, center: Vec2, radius: f32, color: Color);
    fn draw_polygon(&mut self, vertices: &[Vec2], color: Color);
    /// Show the finished frame
    fn present(&mut self) {}
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Disk {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Polygon {
        vertices: Vec<Vec2>,
        color: Color,
    },
}

/// Canvas that stores the calls of the current frame
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub calls: Vec<DrawCall>,
    pub frames: u64,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disks(&self) -> impl Iterator<Item = (Vec2, f32, Color)> + '_ {
        self.calls.iter().filter_map(|c| match *c {
            DrawCall::Disk {
                center,
                radius,
                color,
            } => Some((center, radius, color)),
            _ => None,
        })
    }

    pub fn polygons(&self) -> impl Iterator<Item = (&[Vec2], Color)> + '_ {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::Polygon { vertices, color } => Some((vertices.as_slice(), *color)),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, color: Color) {
        self.calls.clear();
        self.calls.push(DrawCall::Clear(color));
    }

    fn draw_disk(&mut self, center: Vec2, radius: f32, color: Color) {
        self.calls.push(DrawCall::Disk {
            center,
            radius,
            color,
        });
    }

    fn draw_polygon(&mut self, vertices: &[Vec2], color: Color) {
        self.calls.push(DrawCall::Polygon {
            vertices: vertices.to_vec(),
            color,
        });
    }

    fn present(&mut self) {
        self.frames += 1;
    }
}
