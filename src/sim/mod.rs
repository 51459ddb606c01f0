//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed per-tick integration only
//! - Time comes in as an argument, never read from the system here
//! - No rendering, audio or threading

pub mod ball;
pub mod clock;
pub mod collision;
pub mod mask;
pub mod platform;
pub mod state;
pub mod tick;

pub use ball::{Ball, BallState, reflect_velocity};
pub use clock::{FrameClock, PlaybackClock, TimeSource, WallClock};
pub use collision::{closest_point_on_segment, disk_touches_polygon, point_segment_distance};
pub use mask::{ActionMask, MaskContext, angle_action, compute_action_mask};
pub use platform::{Anchor, Platform};
pub use state::{Commit, Outcome, PlacedPlatform, Session, SessionRecord};
pub use tick::{Effect, Game, GamePhase, TickInput, pointer_angle, tick};
