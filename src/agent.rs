//! Automated-agent environment
//!
//! Same ball, platforms and validator as the interactive flow, but time only
//! moves when `step` is called: each step is one frame. Notes pause the ball
//! exactly like the worker does for the player; the agent's action is the
//! platform angle in whole degrees.

use std::path::Path;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{ANGLE_CHOICES, OBSERVED_PLATFORMS};
use crate::renderer::{Canvas, draw_game};
use crate::sim::clock::{FrameClock, PlaybackClock, TimeSource};
use crate::sim::{ActionMask, Commit, Game, GamePhase, Outcome, Session, SessionRecord, TickInput, tick};
use crate::timeline::{EventQueue, load_timeline};
use crate::{Result, Settings};

/// What the agent sees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub ball: Vec2,
    /// Anchors of the most recent platforms, oldest first, zero-padded at the end
    pub platforms: Vec<Vec2>,
    pub velocity: Vec2,
}

impl Observation {
    fn from_session(session: &Session) -> Self {
        let skip = session.platforms.len().saturating_sub(OBSERVED_PLATFORMS);
        let mut platforms: Vec<Vec2> = session.platforms[skip..].iter().map(|p| p.anchor).collect();
        platforms.resize(OBSERVED_PLATFORMS, Vec2::ZERO);
        Self {
            ball: session.ball.pos,
            platforms,
            velocity: session.ball.vel,
        }
    }
}

/// Diagnostics for one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    /// Mask the action was checked against, if a note was waiting
    pub mask: Option<Vec<u8>>,
    /// Trajectory the ball will follow after a successful bounce
    pub chosen_path: Option<Vec<Vec2>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    pub completed: bool,
    pub info: Info,
}

/// More platforms is better, sinking is worse. Finishing the song doubles
/// the reward, getting stuck halves it.
pub fn reward(platforms: usize, vertical_offset: f32, terminated: bool, completed: bool) -> f32 {
    let base = platforms as f32 - vertical_offset / 10.0;
    match (terminated, completed) {
        (true, true) => base * 2.0,
        (true, false) => base * 0.5,
        _ => base,
    }
}

/// Frame-stepped build session
#[derive(Debug, Clone)]
pub struct BuilderEnv {
    settings: Settings,
    timeline: EventQueue,
    queue: EventQueue,
    session: Session,
    frames: FrameClock,
    controls: PlaybackClock,
    need_action: bool,
    completed: bool,
    terminated: bool,
}

impl BuilderEnv {
    pub fn new(timeline: EventQueue, settings: Settings) -> Self {
        let mut env = Self {
            frames: FrameClock::new(settings.tick_rate),
            session: Session::new(settings.clone()),
            queue: timeline.clone(),
            timeline,
            settings,
            controls: PlaybackClock::new(0.0),
            need_action: false,
            completed: false,
            terminated: false,
        };
        env.reset();
        env
    }

    /// Environment over a MIDI file
    pub fn from_midi(path: impl AsRef<Path>, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let timeline = load_timeline(path, settings.grouping_tolerance)?;
        Ok(Self::new(timeline, settings))
    }

    /// Fresh session: new ball, full queue, initial fall done
    pub fn reset(&mut self) -> Observation {
        self.session = Session::new(self.settings.clone());
        self.session.initial_fall();
        self.queue = self.timeline.clone();
        self.frames = FrameClock::new(self.settings.tick_rate);
        self.controls = PlaybackClock::new(self.frames.now());
        self.controls.time_until_next = self.queue.front().map_or(0.0, |e| e.time);
        self.need_action = false;
        self.completed = false;
        self.terminated = false;
        log::debug!("Environment reset, {} timeline entries", self.queue.len());
        Observation::from_session(&self.session)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mask for the platform waiting on an angle, if any
    pub fn action_mask(&self) -> Option<&ActionMask> {
        self.session.mask.as_ref()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_done(&self) -> bool {
        self.terminated
    }

    pub fn frame(&self) -> u64 {
        self.frames.frame()
    }

    /// Advance one frame with `action` as the angle for any waiting platform.
    /// Illegal angles are not errors: the platform keeps waiting.
    pub fn step(&mut self, action: usize) -> StepResult {
        let mut info = Info::default();
        if !self.terminated {
            self.advance(action % ANGLE_CHOICES, &mut info);
        }
        StepResult {
            observation: Observation::from_session(&self.session),
            reward: reward(
                self.session.platforms.len(),
                self.session.vertical_offset(),
                self.terminated,
                self.completed,
            ),
            terminated: self.terminated,
            completed: self.completed,
            info,
        }
    }

    fn advance(&mut self, action: usize, info: &mut Info) {
        if self.queue.is_empty() {
            self.completed = true;
            self.terminated = true;
            self.session.outcome = Some(if self.session.platforms.is_empty() {
                Outcome::NothingToBuild
            } else {
                Outcome::Completed
            });
            log::info!(
                "Episode complete: {} platforms in {} frames",
                self.session.platforms.len(),
                self.frames.frame()
            );
            return;
        }

        self.session.record_frame();
        let now = self.frames.now();
        let due = self
            .queue
            .front()
            .is_some_and(|entry| self.controls.is_due(entry.time, now));

        if due || self.need_action {
            if !self.session.is_paused() {
                let gap = self.queue.gap_after_front();
                self.controls.pause(now);
                self.controls.time_until_next = gap.unwrap_or(0.0);
                self.session.begin_pause(gap);
                if self.session.outcome == Some(Outcome::NoValidPlacement) {
                    self.terminated = true;
                    self.need_action = false;
                    info.mask = self.action_mask().map(ActionMask::as_bits);
                    return;
                }
            }

            let mask = self.action_mask();
            info.mask = mask.map(ActionMask::as_bits);
            let path = mask.and_then(|m| m.path(action)).map(<[Vec2]>::to_vec);

            match self.session.commit(action as f32) {
                Commit::Bounced => {
                    self.need_action = false;
                    self.queue.pop_front();
                    self.controls.resume(now);
                    info.chosen_path = path;
                }
                Commit::Deferred => self.need_action = true,
                Commit::NotPaused => {}
            }
        }

        self.session.tick();
        self.frames.advance();
    }

    /// Snapshot of the current session
    pub fn record(&self) -> SessionRecord {
        self.session.record()
    }

    /// Replay the recorded frames onto `canvas`. Returns the frames drawn.
    pub fn playback(&self, canvas: &mut impl Canvas) -> usize {
        let mut game = Game::replaying(self.session.clone());
        let mut drawn = 0;
        while game.phase != GamePhase::MainMenu {
            tick(&mut game, &TickInput::default());
            if matches!(game.phase, GamePhase::Playback { .. }) {
                draw_game(&game, canvas);
                drawn += 1;
            }
        }
        drawn
    }
}

/// Picks an angle for the next step
pub trait Agent {
    fn act(&mut self, env: &BuilderEnv) -> usize;
}

/// Uniform over the legal angles when a mask is up, over all angles otherwise
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: Pcg32,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn act(&mut self, env: &BuilderEnv) -> usize {
        if let Some(mask) = env.action_mask() {
            let legal: Vec<usize> = mask.legal_actions().collect();
            if !legal.is_empty() {
                return legal[self.rng.random_range(0..legal.len())];
            }
        }
        self.rng.random_range(0..ANGLE_CHOICES)
    }
}

/// Summary of one finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub steps: usize,
    pub reward: f32,
    pub completed: bool,
    pub platforms: usize,
}

/// Run `agent` until the episode ends or `max_steps` is reached
pub fn run_episode(env: &mut BuilderEnv, agent: &mut impl Agent, max_steps: usize) -> Episode {
    env.reset();
    let mut last = None;
    let mut steps = 0;
    while steps < max_steps {
        let action = agent.act(env);
        let result = env.step(action);
        steps += 1;
        let done = result.terminated;
        last = Some(result);
        if done {
            break;
        }
    }
    Episode {
        steps,
        reward: last.as_ref().map_or(0.0, |r| r.reward),
        completed: last.as_ref().is_some_and(|r| r.completed),
        platforms: env.session().platforms.len(),
    }
}
