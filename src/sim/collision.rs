//! Disk vs. polygon overlap tests
//!
//! Discrete checks only: a disk at one sampled position against the edges of
//! a polygon. Trajectories are sampled once per tick by the caller.

use glam::Vec2;

/// Closest point to `p` on the segment `a..b`.
///
/// A zero-length segment collapses to its single point.
#[inline]
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    a + seg * t
}

/// Distance from `p` to the segment `a..b`
#[inline]
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    (p - closest_point_on_segment(p, a, b)).length()
}

/// Minimum distance from `p` to the closed boundary of a polygon.
///
/// Returns `f32::INFINITY` for an empty polygon.
pub fn polygon_edge_distance(p: Vec2, vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    match n {
        0 => f32::INFINITY,
        1 => p.distance(vertices[0]),
        _ => (0..n)
            .map(|i| point_segment_distance(p, vertices[i], vertices[(i + 1) % n]))
            .fold(f32::INFINITY, f32::min),
    }
}

/// Does a disk of `radius` at `center` touch the polygon boundary?
#[inline]
pub fn disk_touches_polygon(center: Vec2, radius: f32, vertices: &[Vec2]) -> bool {
    polygon_edge_distance(center, vertices) <= radius
}
