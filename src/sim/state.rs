//! Session state shared by the interactive and automated flows
//!
//! Owns the ball, the placed platforms and the frame history. The event
//! queue and clocks live with whichever flow drives the session.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::mask::{ActionMask, MaskContext, angle_action, compute_action_mask};
use super::platform::{Anchor, Platform};
use crate::{Result, Settings};

/// How a build session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every note got a platform
    Completed,
    /// The song had no playable notes
    NothingToBuild,
    /// A note arrived with no legal platform angle
    NoValidPlacement,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::NoValidPlacement)
    }
}

/// Result of trying to commit an angle for the pending platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Ball resumed and bounced
    Bounced,
    /// Angle is illegal right now; try again later
    Deferred,
    /// Nothing is waiting for an angle
    NotPaused,
}

/// A live build session
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    pub ball: Ball,
    /// Oldest first. While paused the last one is the pending platform.
    pub platforms: Vec<Platform>,
    /// Ball position for every unpaused frame (world space)
    pub history: Vec<Vec2>,
    /// Mask for the pending platform
    pub mask: Option<ActionMask>,
    /// Gap to the note after the pending one, used for previews
    pub next_gap: Option<f64>,
    pub outcome: Option<Outcome>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let ball = Ball::new(&settings);
        Self {
            settings,
            ball,
            platforms: Vec::new(),
            history: Vec::new(),
            mask: None,
            next_gap: None,
            outcome: None,
        }
    }

    /// Camera offset that keeps the ball on the camera row
    pub fn vertical_offset(&self) -> f32 {
        self.settings.vertical_offset(self.ball.pos.y)
    }

    pub fn is_paused(&self) -> bool {
        self.ball.is_paused()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Free fall before the song starts, recorded into the history
    pub fn initial_fall(&mut self) {
        for _ in 0..self.settings.initial_fall_ticks() {
            self.history.push(self.ball.pos);
            self.ball.tick();
        }
    }

    /// Append the current position unless paused
    pub fn record_frame(&mut self) {
        if !self.ball.is_paused() {
            self.history.push(self.ball.pos);
        }
    }

    /// Advance the ball one tick
    pub fn tick(&mut self) {
        self.ball.tick();
    }

    /// The platform being aimed, if paused
    pub fn pending(&self) -> Option<&Platform> {
        if self.ball.is_paused() {
            self.platforms.last()
        } else {
            None
        }
    }

    /// A note fired: freeze the ball, create a platform at it and evaluate
    /// every angle. An all-illegal mask ends the session.
    pub fn begin_pause(&mut self, next_gap: Option<f64>) -> &ActionMask {
        self.ball.pause();
        let mut platform = Platform::new(self.ball.pos, &self.settings);
        let offset = self.vertical_offset();
        platform.recompute_vertices(Anchor::Live(self.ball.pos), offset);

        let mask = compute_action_mask(&MaskContext {
            ball: &self.ball,
            pending: &platform,
            placed: &self.platforms,
            history: &self.history,
            next_gap,
            vertical_offset: offset,
            settings: &self.settings,
        });

        self.platforms.push(platform);
        self.next_gap = next_gap;
        if mask.is_all_illegal() {
            log::info!(
                "No legal placement for platform {}; session failed",
                self.platforms.len()
            );
            self.outcome = Some(Outcome::NoValidPlacement);
        } else {
            log::debug!(
                "Paused at {:?}, {} legal angles",
                self.ball.pos,
                mask.legal_count()
            );
        }
        self.mask.insert(mask)
    }

    /// Point the pending platform at the nearest whole degree and refresh
    /// the preview path. Returns whether that degree is currently legal.
    pub fn aim(&mut self, angle: f32) -> bool {
        if !self.ball.is_paused() {
            return false;
        }
        let angle = angle_action(angle) as f32;
        let offset = self.vertical_offset();
        let pos = self.ball.pos;
        let Some(platform) = self.platforms.last_mut() else {
            return false;
        };
        platform.set_angle(angle);
        platform.recompute_vertices(Anchor::Live(pos), offset);
        let angle = platform.angle();

        let gap = self.next_gap.unwrap_or(0.0) as f32;
        let step = self.settings.time_step();
        self.ball.update_projection(angle, gap, step);

        self.mask.as_ref().is_some_and(|m| m.is_legal_angle(angle))
    }

    /// Lock in `angle`, snapped to the nearest whole degree, for the pending
    /// platform: resume and bounce. Illegal angles are deferred, not errors.
    pub fn commit(&mut self, angle: f32) -> Commit {
        if !self.ball.is_paused() || self.platforms.is_empty() {
            return Commit::NotPaused;
        }
        let angle = angle_action(angle) as f32;
        let legal = self.mask.as_ref().is_some_and(|m| m.is_legal_angle(angle));
        if !legal {
            log::debug!("Angle {angle:.1} is not legal, deferring");
            return Commit::Deferred;
        }

        let offset = self.vertical_offset();
        let restitution = self.ball.restitution;
        if let Some(platform) = self.platforms.last_mut() {
            platform.set_angle(angle);
            platform.recompute_vertices(Anchor::Fixed, offset);
        }
        let angle = self.platforms.last().map_or(angle, Platform::angle);

        self.ball.resume();
        self.ball.reflect(angle, restitution);
        self.ball.projected_path.clear();
        self.mask = None;
        log::debug!("Bounced off platform {} at {angle:.1}", self.platforms.len());
        Commit::Bounced
    }

    /// Snapshot for saving or replay
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            frames: self.history.clone(),
            platforms: self
                .platforms
                .iter()
                .map(|p| PlacedPlatform {
                    anchor: p.anchor,
                    angle: p.angle(),
                })
                .collect(),
            outcome: self.outcome,
        }
    }
}

/// A platform as saved in a record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedPlatform {
    pub anchor: Vec2,
    pub angle: f32,
}

/// Saved build: enough to replay it frame by frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub frames: Vec<Vec2>,
    pub platforms: Vec<PlacedPlatform>,
    pub outcome: Option<Outcome>,
}

impl SessionRecord {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, serde_json::to_string(self)?)?;
        log::info!(
            "Saved {} frames / {} platforms to {}",
            self.frames.len(),
            self.platforms.len(),
            path.display()
        );
        Ok(())
    }

    /// Platforms rebuilt for drawing a replay
    pub fn rebuild_platforms(&self, settings: &Settings) -> Vec<Platform> {
        self.platforms
            .iter()
            .map(|p| {
                let mut platform = Platform::new(p.anchor, settings);
                platform.set_angle(p.angle);
                platform.recompute_vertices(Anchor::Fixed, 0.0);
                platform
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Settings::default())
    }

    #[test]
    fn test_initial_fall_records_history() {
        let mut s = session();
        s.initial_fall();
        assert_eq!(s.history.len(), 15);
        assert_eq!(s.history[0], Vec2::new(400.0, 100.0));
        assert!(s.ball.pos.y > 100.0);
        assert!(s.ball.vel.y > 0.0);
    }

    #[test]
    fn test_pause_creates_pending_platform() {
        let mut s = session();
        s.initial_fall();
        s.record_frame();
        let pos = s.ball.pos;
        let legal = s.begin_pause(Some(0.7)).legal_count();
        assert!(legal > 0);
        assert!(s.is_paused());
        assert_eq!(s.platforms.len(), 1);
        assert_eq!(s.pending().unwrap().anchor, pos);
        assert!(s.outcome.is_none());

        // paused frames are not recorded
        let n = s.history.len();
        s.record_frame();
        assert_eq!(s.history.len(), n);
    }

    #[test]
    fn test_commit_illegal_is_deferred() {
        let mut s = session();
        s.initial_fall();
        s.record_frame();
        s.begin_pause(Some(0.7));
        // ceiling above a falling ball cuts through its own path
        assert_eq!(s.commit(90.0), Commit::Deferred);
        assert!(s.is_paused());
        assert_eq!(s.commit(270.0), Commit::Bounced);
        assert!(!s.is_paused());
        assert!(s.ball.vel.y < 0.0);
        assert_eq!(s.commit(270.0), Commit::NotPaused);
    }

    #[test]
    fn test_aim_updates_preview() {
        let mut s = session();
        s.initial_fall();
        s.record_frame();
        s.begin_pause(Some(1.0));
        assert!(s.aim(270.0));
        assert_eq!(s.ball.projected_path.len(), 30);
        assert!(!s.aim(90.0));
        assert!((s.pending().unwrap().angle() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounce_follows_projection() {
        let mut s = session();
        s.initial_fall();
        s.record_frame();
        s.begin_pause(Some(1.0));
        let expected = s.mask.as_ref().unwrap().path(300).unwrap().to_vec();
        assert_eq!(s.commit(300.0), Commit::Bounced);
        for p in expected {
            s.tick();
            assert_eq!(s.ball.pos, p);
        }
    }

    #[test]
    fn test_fractional_commit_snaps_to_validated_degree() {
        let mut s = session();
        s.initial_fall();
        s.record_frame();
        s.begin_pause(Some(1.0));
        let mask = s.mask.clone().unwrap();
        assert!(mask.is_legal(300));
        let expected = mask.path(300).unwrap().to_vec();

        assert_eq!(s.commit(300.4), Commit::Bounced);
        assert_eq!(s.platforms.last().unwrap().angle(), 300.0);
        for p in expected {
            s.tick();
            assert_eq!(s.ball.pos, p);
        }
    }

    #[test]
    fn test_fractional_aim_previews_validated_path() {
        let mut s = session();
        s.initial_fall();
        s.record_frame();
        s.begin_pause(Some(1.0));
        let expected = s.mask.as_ref().unwrap().path(300).unwrap().to_vec();

        let legal = s.aim(299.6);
        assert_eq!(legal, s.mask.as_ref().unwrap().is_legal(300));
        assert_eq!(s.pending().unwrap().angle(), 300.0);
        assert_eq!(s.ball.projected_path, expected);
    }

    #[test]
    fn test_record_round_trip_file() {
        let mut s = session();
        s.initial_fall();
        s.record_frame();
        s.begin_pause(None);
        s.commit(270.0);
        s.outcome = Some(Outcome::Completed);

        let record = s.record();
        assert_eq!(record.platforms.len(), 1);
        assert_eq!(record.platforms[0].angle, 270.0);

        let path = std::env::temp_dir().join(format!("bounce_record_{}.json", std::process::id()));
        record.save(&path).unwrap();
        let loaded = SessionRecord::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, record);
        assert_eq!(loaded.rebuild_platforms(&Settings::default()).len(), 1);
    }

    #[test]
    fn test_outcome_success() {
        assert!(Outcome::Completed.is_success());
        assert!(Outcome::NothingToBuild.is_success());
        assert!(!Outcome::NoValidPlacement.is_success());
    }
}
