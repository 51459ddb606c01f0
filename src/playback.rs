//! Timeline worker
//!
//! Walks the event queue on its own thread and tells the frame loop when an
//! entry is due. The worker never touches the ball or platforms: it only
//! flips the shared pause state and posts a signal. The frame loop commits the
//! paused interval when the player resumes.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::consts::WORKER_POLL_SECS;
use crate::sim::clock::{PlaybackClock, TimeSource};
use crate::timeline::EventQueue;

/// Pause state shared between the frame loop and the worker
pub type SharedControls = Arc<Mutex<PlaybackClock>>;

pub fn shared_controls(start_time: f64) -> SharedControls {
    Arc::new(Mutex::new(PlaybackClock::new(start_time)))
}

/// Posted by the worker to the frame loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineSignal {
    /// An entry at `time` is due. `next_gap` is the time to the entry after it.
    NoteOn { time: f64, next_gap: Option<f64> },
    /// Queue drained
    Finished,
}

/// How the worker treats due entries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkerMode {
    /// Pause on each entry and wait for the frame loop to resume
    Builder,
    /// Fire entries on schedule without pausing, shifted `lead_in` seconds
    /// later to line up with a recording that opens with the initial fall
    Playback { lead_in: f64 },
}

/// Handle to a running timeline thread
pub struct TimelineWorker {
    thread: Option<thread::JoinHandle<()>>,
    receiver: Receiver<TimelineSignal>,
    controls: SharedControls,
}

impl TimelineWorker {
    pub fn spawn<T>(queue: EventQueue, controls: SharedControls, source: T, mode: WorkerMode) -> Self
    where
        T: TimeSource + Send + 'static,
    {
        let (tx, rx) = channel();
        let shared = Arc::clone(&controls);
        log::info!("Starting {mode:?} timeline worker ({} entries)", queue.len());
        let thread = thread::spawn(move || match mode {
            WorkerMode::Builder => run_builder(queue, &shared, &source, &tx),
            WorkerMode::Playback { lead_in } => run_playback(queue, &shared, &source, lead_in, &tx),
        });
        Self {
            thread: Some(thread),
            receiver: rx,
            controls,
        }
    }

    pub fn controls(&self) -> &SharedControls {
        &self.controls
    }

    /// Everything posted since the last drain, without blocking
    pub fn drain(&self) -> Vec<TimelineSignal> {
        let mut signals = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(signal) => signals.push(signal),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        signals
    }

    /// Wait up to `timeout` for the next signal
    pub fn recv_timeout(&self, timeout: Duration) -> Option<TimelineSignal> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Raise the stop flag and join the thread
    pub fn stop(&mut self) {
        self.controls.lock().stop();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("Timeline worker panicked");
            }
            log::debug!("Timeline worker joined");
        }
    }
}

impl Drop for TimelineWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_sleep(seconds: f64) {
    let secs = seconds.clamp(0.0, WORKER_POLL_SECS);
    thread::sleep(Duration::from_secs_f64(secs.max(0.001)));
}

fn run_builder(
    mut queue: EventQueue,
    controls: &SharedControls,
    source: &impl TimeSource,
    tx: &Sender<TimelineSignal>,
) {
    let mut awaiting_resume = false;
    loop {
        let now = source.now();
        let wait = {
            let mut clock = controls.lock();
            if clock.is_stopped() {
                return;
            }
            if awaiting_resume {
                if clock.is_paused() {
                    WORKER_POLL_SECS
                } else {
                    queue.pop_front();
                    awaiting_resume = false;
                    continue;
                }
            } else {
                let Some(entry) = queue.front() else {
                    drop(clock);
                    log::info!("Timeline finished");
                    let _ = tx.send(TimelineSignal::Finished);
                    return;
                };
                let time = entry.time;
                let elapsed = clock.elapsed(now);
                if clock.is_paused() || elapsed < time {
                    time - elapsed
                } else {
                    let next_gap = queue.gap_after_front();
                    clock.pause(now);
                    clock.time_until_next = next_gap.unwrap_or(0.0);
                    drop(clock);
                    log::debug!("Entry at {time:.3}s due (elapsed {elapsed:.3}s)");
                    if tx.send(TimelineSignal::NoteOn { time, next_gap }).is_err() {
                        return;
                    }
                    awaiting_resume = true;
                    continue;
                }
            }
        };
        poll_sleep(wait);
    }
}

fn run_playback(
    mut queue: EventQueue,
    controls: &SharedControls,
    source: &impl TimeSource,
    lead_in: f64,
    tx: &Sender<TimelineSignal>,
) {
    let start = source.now() + lead_in.max(0.0);
    loop {
        if controls.lock().is_stopped() {
            return;
        }
        let Some(time) = queue.front().map(|e| e.time) else {
            log::info!("Replay timeline finished");
            let _ = tx.send(TimelineSignal::Finished);
            return;
        };
        let elapsed = source.now() - start;
        if elapsed >= time {
            let next_gap = queue.gap_after_front();
            queue.pop_front();
            if tx.send(TimelineSignal::NoteOn { time, next_gap }).is_err() {
                return;
            }
        } else {
            poll_sleep(time - elapsed);
        }
    }
}
