//! Interactive frame loop
//!
//! Polls input, drains timeline signals, ticks the game, carries out the
//! effects it returns and draws the frame, then sleeps out the rest of the
//! frame. The timeline worker and the backing track are owned here; the
//! simulation never sees them.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::AudioSink;
use crate::input::InputSource;
use crate::playback::{SharedControls, TimelineWorker, WorkerMode, shared_controls};
use crate::renderer::{Canvas, draw_game};
use crate::sim::clock::{TimeSource, WallClock};
use crate::sim::{Effect, Game, Outcome, TickInput, tick};
use crate::timeline::EventQueue;
use crate::{Result, Settings};

pub struct App<I, A, C> {
    game: Game,
    timeline: EventQueue,
    input: I,
    audio: A,
    canvas: C,
    clock: WallClock,
    controls: SharedControls,
    worker: Option<TimelineWorker>,
    frame_time: Duration,
    frames: u64,
}

impl<I, A, C> App<I, A, C>
where
    I: InputSource,
    A: AudioSink,
    C: Canvas,
{
    /// Fails if the settings cannot drive a frame loop
    pub fn new(settings: Settings, timeline: EventQueue, input: I, audio: A, canvas: C) -> Result<Self> {
        settings.validate()?;
        let clock = WallClock::new();
        let frame_time = Duration::from_secs_f32(settings.time_step());
        Ok(Self {
            game: Game::new(settings),
            timeline,
            input,
            audio,
            canvas,
            controls: shared_controls(clock.now()),
            clock,
            worker: None,
            frame_time,
            frames: 0,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn worker_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Run until quit. Returns how the last build session ended, if any did.
    pub fn run(&mut self) -> Result<Option<Outcome>> {
        log::info!("Frame loop started at {:.0} fps", self.game.settings().tick_rate);
        while self.game.running {
            let started = Instant::now();
            if let Err(e) = self.frame() {
                self.shutdown();
                return Err(e);
            }
            if let Some(rest) = self.frame_time.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        self.shutdown();
        log::info!("Frame loop finished after {} frames", self.frames);
        Ok(self.game.session.outcome)
    }

    /// One frame without pacing
    pub fn frame(&mut self) -> Result<()> {
        let events = self.input.poll();
        let signals = self.worker.as_ref().map(TimelineWorker::drain).unwrap_or_default();
        let effects = tick(&mut self.game, &TickInput { events, signals });
        for effect in effects {
            self.apply(effect)?;
        }
        draw_game(&self.game, &mut self.canvas);
        self.frames += 1;
        Ok(())
    }

    fn apply(&mut self, effect: Effect) -> Result<()> {
        log::debug!("Effect {effect:?}");
        match effect {
            Effect::StartBuild => {
                self.start_track()?;
                self.start_worker(WorkerMode::Builder);
            }
            Effect::Pause => self.audio.pause(),
            Effect::Resume => {
                let paused = self.controls.lock().resume(self.clock.now());
                log::debug!("Resumed after {paused:.3}s paused");
                self.audio.resume();
            }
            Effect::StartReplay => {
                self.stop_worker();
                self.audio.stop();
                self.start_track()?;
                // the recording opens with the initial fall, the timeline does not
                let settings = self.game.settings();
                let lead_in = settings.initial_fall_ticks() as f64 / settings.tick_rate as f64;
                self.start_worker(WorkerMode::Playback { lead_in });
            }
            Effect::Stop => {
                self.stop_worker();
                self.audio.stop();
            }
            Effect::Quit => {}
        }
        Ok(())
    }

    fn start_track(&mut self) -> Result<()> {
        if let Some(path) = self.game.settings().audio_path.clone() {
            self.audio.load_and_loop(Path::new(&path))?;
        }
        Ok(())
    }

    fn start_worker(&mut self, mode: WorkerMode) {
        self.stop_worker();
        self.controls = shared_controls(self.clock.now());
        self.worker = Some(TimelineWorker::spawn(
            self.timeline.clone(),
            Arc::clone(&self.controls),
            self.clock,
            mode,
        ));
    }

    fn stop_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }

    fn shutdown(&mut self) {
        self.stop_worker();
        self.audio.stop();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::Error;
    use crate::audio::{SilentAudio, Transport};
    use crate::input::{Input, ScriptedInput};
    use crate::renderer::RecordingCanvas;
    use crate::sim::GamePhase;

    fn app(settings: Settings, times: &[f64], input: ScriptedInput) -> App<ScriptedInput, SilentAudio, RecordingCanvas> {
        App::new(
            settings,
            EventQueue::from_times(times),
            input,
            SilentAudio::new(),
            RecordingCanvas::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let settings = Settings {
            tick_rate: 0.0,
            ..Settings::default()
        };
        let result = App::new(
            settings,
            EventQueue::from_times(&[0.1]),
            ScriptedInput::default(),
            SilentAudio::new(),
            RecordingCanvas::new(),
        );
        assert!(matches!(result, Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn test_one_note_session() {
        // while paused the ball sits on the camera row, so this is straight below it
        let below = Vec2::new(400.0, 260.0);
        let input = ScriptedInput::default()
            .then(vec![Input::Start])
            .idle(12)
            .then(vec![Input::PointerMoved(below), Input::Resume])
            .idle(80);
        let mut app = app(Settings::default(), &[0.1], input);

        let outcome = app.run().unwrap();
        assert_eq!(outcome, Some(Outcome::Completed));
        assert_eq!(app.game().session.platforms.len(), 1);
        assert_eq!(app.game().phase, GamePhase::MainMenu);
        assert!(!app.game().running);
        assert!(!app.worker_running());
        assert_eq!(app.audio().transport(), Transport::Stopped);
        assert_eq!(app.canvas().frames, app.frames());
    }

    #[test]
    fn test_quit_mid_build_stops_worker() {
        let input = ScriptedInput::default().then(vec![Input::Start]).idle(3);
        let mut app = app(Settings::default(), &[5.0], input);
        let outcome = app.run().unwrap();
        assert_eq!(outcome, None);
        assert!(!app.worker_running());
        assert_eq!(app.game().phase, GamePhase::Builder);
    }

    #[test]
    fn test_missing_track_aborts_setup() {
        let settings = Settings {
            audio_path: Some("/no/such/track.wav".into()),
            ..Settings::default()
        };
        let input = ScriptedInput::default().then(vec![Input::Start]).idle(5);
        let mut app = app(settings, &[0.1], input);
        let err = app.run().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!app.worker_running());
    }

    #[test]
    fn test_worker_signals_reach_game() {
        let mut app = app(
            Settings::default(),
            &[0.05],
            ScriptedInput::default().then(vec![Input::Start]).idle(100),
        );
        app.frame().unwrap();
        app.frame().unwrap();
        assert!(app.worker_running());
        thread::sleep(Duration::from_millis(150));
        app.frame().unwrap();
        assert!(app.game().session.is_paused());
        assert!(app.controls.lock().is_paused());
    }
}
