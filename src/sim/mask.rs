//! Placement validator
//!
//! For each of the 360 whole-degree angles, aims the pending platform and
//! simulates the bounce up to the next note. An angle is illegal when:
//! - the projected path touches any earlier platform,
//! - the projected path comes within `edge_margin` of a side of the screen,
//! - the platform would overlap a position the ball already passed through.
//!
//! The same mask gates the human resume key and the agent's action space.

use glam::Vec2;

use super::ball::Ball;
use super::platform::{Anchor, Platform};
use crate::Settings;
use crate::consts::ANGLE_CHOICES;

/// Legal angles plus the trajectory simulated for each
#[derive(Debug, Clone, PartialEq)]
pub struct ActionMask {
    legal: Vec<bool>,
    paths: Vec<Vec<Vec2>>,
}

impl ActionMask {
    pub fn legal(&self) -> &[bool] {
        &self.legal
    }

    /// Trajectory (world space) projected for every angle; empty when no note follows
    pub fn paths(&self) -> &[Vec<Vec2>] {
        &self.paths
    }

    pub fn path(&self, action: usize) -> Option<&[Vec2]> {
        self.paths.get(action).map(Vec::as_slice)
    }

    pub fn is_legal(&self, action: usize) -> bool {
        self.legal.get(action).copied().unwrap_or(false)
    }

    /// Legality of a continuous angle, rounded to the nearest whole degree
    pub fn is_legal_angle(&self, degrees: f32) -> bool {
        self.is_legal(angle_action(degrees))
    }

    pub fn legal_count(&self) -> usize {
        self.legal.iter().filter(|&&ok| ok).count()
    }

    /// No angle works: the session is stuck
    pub fn is_all_illegal(&self) -> bool {
        self.legal_count() == 0
    }

    pub fn legal_actions(&self) -> impl Iterator<Item = usize> + '_ {
        self.legal
            .iter()
            .enumerate()
            .filter_map(|(i, &ok)| ok.then_some(i))
    }

    /// Mask as 0/1 values, the shape an agent consumes
    pub fn as_bits(&self) -> Vec<u8> {
        self.legal.iter().map(|&ok| ok as u8).collect()
    }
}

/// Nearest whole-degree action for a continuous angle
pub fn angle_action(degrees: f32) -> usize {
    degrees.round().rem_euclid(ANGLE_CHOICES as f32) as usize % ANGLE_CHOICES
}

/// Everything the validator looks at
pub struct MaskContext<'a> {
    /// Paused ball; its pre-pause velocity is what gets reflected
    pub ball: &'a Ball,
    /// Platform being aimed
    pub pending: &'a Platform,
    /// Platforms already bounced off, oldest first
    pub placed: &'a [Platform],
    /// Ball positions so far (world space). The last entry is the current
    /// position and is not checked.
    pub history: &'a [Vec2],
    /// Seconds until the note after this one, if any
    pub next_gap: Option<f64>,
    pub vertical_offset: f32,
    pub settings: &'a Settings,
}

/// Evaluate all 360 angles
pub fn compute_action_mask(ctx: &MaskContext<'_>) -> ActionMask {
    let settings = ctx.settings;
    let offset = ctx.vertical_offset;
    let to_screen = |p: Vec2| Vec2::new(p.x, p.y - offset);
    let min_x = settings.edge_margin;
    let max_x = settings.screen_width - settings.edge_margin;
    let radius = ctx.ball.radius;

    let placed: Vec<Platform> = ctx
        .placed
        .iter()
        .map(|p| {
            let mut p = p.clone();
            p.recompute_vertices(Anchor::Fixed, offset);
            p
        })
        .collect();

    let past = &ctx.history[..ctx.history.len().saturating_sub(1)];

    let mut pending = ctx.pending.clone();
    let mut legal = Vec::with_capacity(ANGLE_CHOICES);
    let mut paths = Vec::with_capacity(ANGLE_CHOICES);

    for action in 0..ANGLE_CHOICES {
        let angle = action as f32;
        pending.set_angle(angle);
        pending.recompute_vertices(Anchor::Live(ctx.ball.pos), offset);

        let path = match ctx.next_gap {
            Some(gap) => ctx.ball.project_path(
                angle,
                ctx.ball.restitution,
                ctx.ball.gravity,
                gap as f32,
                settings.time_step(),
            ),
            None => Vec::new(),
        };

        let path_clear = path.iter().map(|&p| to_screen(p)).all(|p| {
            p.x >= min_x && p.x <= max_x && !placed.iter().any(|pl| pl.check_collision(p, radius))
        });

        let clear_of_history =
            path_clear && !past.iter().any(|&p| pending.check_collision(to_screen(p), radius));

        legal.push(clear_of_history);
        paths.push(path);
    }

    let mask = ActionMask { legal, paths };
    log::debug!("Action mask: {} legal angles", mask.legal_count());
    mask
}
