//! Per-frame phase machine
//!
//! `tick` consumes one frame of input and timeline signals, mutates the game
//! and returns the side effects the driver must carry out (audio, worker).
//! Nothing in here sleeps, spawns or reads the clock.

use glam::Vec2;

use super::mask::angle_action;
use super::state::{Commit, Outcome, Session};
use crate::input::Input;
use crate::playback::TimelineSignal;
use crate::{Settings, normalize_degrees};

/// Where the game is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GamePhase {
    MainMenu,
    /// One frame: initial fall, then hand over to `Builder`
    InitBuilder,
    /// Building: notes pause the ball, the player aims and resumes
    Builder,
    /// One frame: rewind for the replay
    InitPlayback,
    /// Replaying the recorded frames
    Playback { frame: usize, notes: usize },
    /// Session over without a replay; waits for `Start`
    Finished(Outcome),
}

/// Side effects requested by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Build the timeline, start the builder worker and the backing track
    StartBuild,
    /// A note paused the ball; pause the backing track
    Pause,
    /// The player bounced; commit the paused interval and resume audio
    Resume,
    /// Start the replay worker and restart the backing track
    StartReplay,
    /// Stop the worker and the backing track
    Stop,
    /// Leave the frame loop
    Quit,
}

/// Everything that happened since the last frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub events: Vec<Input>,
    pub signals: Vec<TimelineSignal>,
}

impl TickInput {
    pub fn events(events: Vec<Input>) -> Self {
        Self {
            events,
            signals: Vec::new(),
        }
    }

    pub fn signals(signals: Vec<TimelineSignal>) -> Self {
        Self {
            events: Vec::new(),
            signals,
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct Game {
    pub phase: GamePhase,
    pub session: Session,
    pub running: bool,
    /// Angle under the pointer while paused
    pub aim: Option<f32>,
    /// Whether `aim` (a whole degree) is legal for the pending platform
    pub can_resume: bool,
    pointer: Option<Vec2>,
}

impl Game {
    pub fn new(settings: Settings) -> Self {
        Self {
            phase: GamePhase::MainMenu,
            session: Session::new(settings),
            running: true,
            aim: None,
            can_resume: false,
            pointer: None,
        }
    }

    /// Game ready to replay a finished session
    pub fn replaying(session: Session) -> Self {
        Self {
            phase: GamePhase::InitPlayback,
            session,
            running: true,
            aim: None,
            can_resume: false,
            pointer: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.session.settings
    }

    /// Ball position to draw this frame: live while building, recorded during a replay
    pub fn ball_position(&self) -> Vec2 {
        match self.phase {
            GamePhase::Playback { frame, .. } => self
                .session
                .history
                .get(frame)
                .copied()
                .unwrap_or(self.session.ball.pos),
            _ => self.session.ball.pos,
        }
    }

    fn reset_session(&mut self) {
        self.session = Session::new(self.session.settings.clone());
        self.aim = None;
        self.can_resume = false;
    }

    /// Aim at the pointer if the ball is waiting for a platform
    fn refresh_aim(&mut self) {
        let Some(pointer) = self.pointer else {
            return;
        };
        if !self.session.is_paused() {
            return;
        }
        let raw = pointer_angle(self.session.ball.pos, pointer, self.session.vertical_offset());
        let angle = angle_action(raw) as f32;
        self.can_resume = self.session.aim(angle);
        self.aim = Some(angle);
    }
}

/// Platform angle for a pointer at `pointer` (screen space): the direction
/// from the ball toward the pointer, degrees counter-clockwise.
pub fn pointer_angle(ball: Vec2, pointer: Vec2, vertical_offset: f32) -> f32 {
    let dy = ball.y - pointer.y - vertical_offset;
    let dx = pointer.x - ball.x;
    normalize_degrees(dy.atan2(dx).to_degrees())
}

/// Advance the game by one frame
pub fn tick(game: &mut Game, input: &TickInput) -> Vec<Effect> {
    let mut effects = Vec::new();

    if input.events.contains(&Input::Quit) {
        log::info!("Quit requested");
        game.running = false;
        if matches!(
            game.phase,
            GamePhase::Builder | GamePhase::Playback { .. } | GamePhase::InitPlayback
        ) {
            effects.push(Effect::Stop);
        }
        effects.push(Effect::Quit);
        return effects;
    }

    match game.phase {
        GamePhase::MainMenu => tick_menu(game, input),
        GamePhase::InitBuilder => tick_init_builder(game, &mut effects),
        GamePhase::Builder => tick_builder(game, input, &mut effects),
        GamePhase::InitPlayback => tick_init_playback(game, &mut effects),
        GamePhase::Playback { frame, notes } => {
            tick_playback(game, input, frame, notes, &mut effects)
        }
        GamePhase::Finished(_) => tick_finished(game, input),
    }

    effects
}

fn tick_menu(game: &mut Game, input: &TickInput) {
    if input.events.contains(&Input::Start) {
        game.reset_session();
        game.phase = GamePhase::InitBuilder;
    }
}

fn tick_init_builder(game: &mut Game, effects: &mut Vec<Effect>) {
    game.session.initial_fall();
    log::info!(
        "Initial fall done, ball at {:?}",
        game.session.ball.pos
    );
    game.phase = GamePhase::Builder;
    effects.push(Effect::StartBuild);
}

fn tick_builder(game: &mut Game, input: &TickInput, effects: &mut Vec<Effect>) {
    game.session.record_frame();

    for signal in &input.signals {
        match *signal {
            TimelineSignal::NoteOn { time, next_gap } => {
                log::debug!("Note at {time:.3}s");
                game.session.begin_pause(next_gap);
                if let Some(Outcome::NoValidPlacement) = game.session.outcome {
                    game.phase = GamePhase::Finished(Outcome::NoValidPlacement);
                    effects.push(Effect::Stop);
                    return;
                }
                game.can_resume = false;
                game.aim = None;
                effects.push(Effect::Pause);
                game.refresh_aim();
            }
            TimelineSignal::Finished => {
                finish_build(game, effects);
                return;
            }
        }
    }

    for event in &input.events {
        match *event {
            Input::PointerMoved(pos) => {
                game.pointer = Some(pos);
                game.refresh_aim();
            }
            Input::Resume => {
                let Some(angle) = game.aim else {
                    continue;
                };
                if game.session.commit(angle) == Commit::Bounced {
                    game.aim = None;
                    game.can_resume = false;
                    effects.push(Effect::Resume);
                }
            }
            Input::Quit | Input::Start | Input::Tick => {}
        }
    }

    game.session.tick();
}

fn finish_build(game: &mut Game, effects: &mut Vec<Effect>) {
    effects.push(Effect::Stop);
    if game.session.platforms.is_empty() {
        log::info!("Nothing to build");
        game.session.outcome = Some(Outcome::NothingToBuild);
        game.phase = GamePhase::Finished(Outcome::NothingToBuild);
    } else {
        log::info!("Build complete with {} platforms", game.session.platforms.len());
        game.session.outcome = Some(Outcome::Completed);
        game.phase = GamePhase::InitPlayback;
    }
}

fn tick_init_playback(game: &mut Game, effects: &mut Vec<Effect>) {
    log::info!("Replaying {} frames", game.session.history.len());
    game.phase = GamePhase::Playback { frame: 0, notes: 0 };
    effects.push(Effect::StartReplay);
}

fn tick_playback(
    game: &mut Game,
    input: &TickInput,
    frame: usize,
    notes: usize,
    effects: &mut Vec<Effect>,
) {
    let notes = notes
        + input
            .signals
            .iter()
            .filter(|s| matches!(s, TimelineSignal::NoteOn { .. }))
            .count();

    let next = frame + 1;
    if next >= game.session.history.len() {
        log::info!("Replay done");
        game.phase = GamePhase::MainMenu;
        effects.push(Effect::Stop);
    } else {
        game.phase = GamePhase::Playback { frame: next, notes };
    }
}

fn tick_finished(game: &mut Game, input: &TickInput) {
    if input.events.contains(&Input::Start) {
        game.phase = GamePhase::MainMenu;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::platform::Platform;

    fn note(next_gap: Option<f64>) -> TimelineSignal {
        TimelineSignal::NoteOn {
            time: 0.5,
            next_gap,
        }
    }

    fn building() -> Game {
        let mut game = Game::new(Settings::default());
        assert!(tick(&mut game, &TickInput::events(vec![Input::Start])).is_empty());
        assert_eq!(game.phase, GamePhase::InitBuilder);
        let effects = tick(&mut game, &TickInput::default());
        assert_eq!(effects, vec![Effect::StartBuild]);
        assert_eq!(game.phase, GamePhase::Builder);
        game
    }

    /// A point straight below the ball on screen
    fn below(game: &Game) -> Vec2 {
        let ball = game.session.ball.pos;
        Vec2::new(ball.x, ball.y - game.session.vertical_offset() + 40.0)
    }

    fn above(game: &Game) -> Vec2 {
        let ball = game.session.ball.pos;
        Vec2::new(ball.x, ball.y - game.session.vertical_offset() - 40.0)
    }

    #[test]
    fn test_pointer_angle() {
        let ball = Vec2::new(100.0, 300.0);
        // offset 100: ball is drawn at y=200
        assert!((pointer_angle(ball, Vec2::new(150.0, 200.0), 100.0) - 0.0).abs() < 1e-4);
        assert!((pointer_angle(ball, Vec2::new(100.0, 150.0), 100.0) - 90.0).abs() < 1e-4);
        assert!((pointer_angle(ball, Vec2::new(100.0, 250.0), 100.0) - 270.0).abs() < 1e-4);
        assert!((pointer_angle(ball, Vec2::new(50.0, 200.0), 100.0) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_start_runs_initial_fall() {
        let game = building();
        assert_eq!(game.session.history.len(), 15);
        assert!(game.session.ball.pos.y > 100.0);
    }

    #[test]
    fn test_builder_records_and_ticks() {
        let mut game = building();
        let y = game.session.ball.pos.y;
        tick(&mut game, &TickInput::default());
        assert_eq!(game.session.history.len(), 16);
        assert!(game.session.ball.pos.y > y);
    }

    #[test]
    fn test_note_pauses_and_resume_bounces() {
        let mut game = building();
        let effects = tick(&mut game, &TickInput::signals(vec![note(Some(0.7))]));
        assert_eq!(effects, vec![Effect::Pause]);
        assert!(game.session.is_paused());
        assert_eq!(game.session.platforms.len(), 1);

        let pos = game.session.ball.pos;
        let history = game.session.history.len();
        let pointer = below(&game);
        tick(&mut game, &TickInput::events(vec![Input::PointerMoved(pointer)]));
        assert!(game.can_resume);
        assert!((game.aim.unwrap() - 270.0).abs() < 1e-3);
        // frozen while paused
        assert_eq!(game.session.ball.pos, pos);
        assert_eq!(game.session.history.len(), history);

        let effects = tick(&mut game, &TickInput::events(vec![Input::Resume]));
        assert_eq!(effects, vec![Effect::Resume]);
        assert!(!game.session.is_paused());
        assert!(game.session.ball.vel.y < 0.0);
        assert!(!game.can_resume);
    }

    #[test]
    fn test_pointer_aim_snaps_to_whole_degree() {
        let mut game = building();
        tick(&mut game, &TickInput::signals(vec![note(Some(0.7))]));
        // raw pointer angle is about 274.29
        let pointer = below(&game) + Vec2::new(3.0, 0.0);
        tick(&mut game, &TickInput::events(vec![Input::PointerMoved(pointer)]));

        assert_eq!(game.aim, Some(274.0));
        let mask = game.session.mask.as_ref().unwrap();
        assert_eq!(game.can_resume, mask.is_legal(274));
        assert_eq!(game.session.ball.projected_path, mask.path(274).unwrap());
    }

    #[test]
    fn test_illegal_aim_defers_resume() {
        let mut game = building();
        tick(&mut game, &TickInput::signals(vec![note(Some(0.7))]));
        let pointer = above(&game);
        let effects = tick(
            &mut game,
            &TickInput::events(vec![Input::PointerMoved(pointer), Input::Resume]),
        );
        assert!(effects.is_empty());
        assert!(!game.can_resume);
        assert!(game.session.is_paused());
    }

    #[test]
    fn test_resume_without_aim_is_ignored() {
        let mut game = building();
        tick(&mut game, &TickInput::signals(vec![note(None)]));
        let effects = tick(&mut game, &TickInput::events(vec![Input::Resume]));
        assert!(effects.is_empty());
        assert!(game.session.is_paused());
    }

    #[test]
    fn test_empty_timeline_is_nothing_to_build() {
        let mut game = building();
        let effects = tick(&mut game, &TickInput::signals(vec![TimelineSignal::Finished]));
        assert_eq!(effects, vec![Effect::Stop]);
        assert_eq!(game.phase, GamePhase::Finished(Outcome::NothingToBuild));
        assert_eq!(game.session.outcome, Some(Outcome::NothingToBuild));

        tick(&mut game, &TickInput::events(vec![Input::Start]));
        assert_eq!(game.phase, GamePhase::MainMenu);
    }

    #[test]
    fn test_no_valid_placement_ends_session() {
        let mut game = building();
        let center = game.session.ball.pos;
        let settings = game.settings().clone();
        game.session.platforms = (0..36)
            .map(|k| {
                let a = k as f32 * 10.0;
                let mut p = Platform::new(center + crate::heading(a) * 80.0, &settings);
                p.set_angle(a);
                p
            })
            .collect();

        let effects = tick(&mut game, &TickInput::signals(vec![note(Some(3.0))]));
        assert_eq!(effects, vec![Effect::Stop]);
        assert_eq!(game.phase, GamePhase::Finished(Outcome::NoValidPlacement));
        assert!(!game.session.outcome.unwrap().is_success());
    }

    #[test]
    fn test_completed_build_replays_then_returns_to_menu() {
        let mut game = building();
        tick(&mut game, &TickInput::signals(vec![note(None)]));
        let pointer = below(&game);
        tick(&mut game, &TickInput::events(vec![Input::PointerMoved(pointer)]));
        tick(&mut game, &TickInput::events(vec![Input::Resume]));
        for _ in 0..5 {
            tick(&mut game, &TickInput::default());
        }

        let effects = tick(&mut game, &TickInput::signals(vec![TimelineSignal::Finished]));
        assert_eq!(effects, vec![Effect::Stop]);
        assert_eq!(game.phase, GamePhase::InitPlayback);
        assert_eq!(game.session.outcome, Some(Outcome::Completed));

        let effects = tick(&mut game, &TickInput::default());
        assert_eq!(effects, vec![Effect::StartReplay]);
        assert_eq!(game.ball_position(), game.session.history[0]);

        let frames = game.session.history.len();
        tick(&mut game, &TickInput::signals(vec![note(None)]));
        assert_eq!(game.phase, GamePhase::Playback { frame: 1, notes: 1 });
        assert_eq!(game.ball_position(), game.session.history[1]);

        let mut last = Vec::new();
        for _ in 1..frames {
            last = tick(&mut game, &TickInput::default());
        }
        assert_eq!(last, vec![Effect::Stop]);
        assert_eq!(game.phase, GamePhase::MainMenu);
    }

    #[test]
    fn test_quit_stops_worker_while_building() {
        let mut game = building();
        let effects = tick(&mut game, &TickInput::events(vec![Input::Quit]));
        assert_eq!(effects, vec![Effect::Stop, Effect::Quit]);
        assert!(!game.running);

        let mut menu = Game::new(Settings::default());
        assert_eq!(
            tick(&mut menu, &TickInput::events(vec![Input::Quit])),
            vec![Effect::Quit]
        );
    }
}
