//! Event timeline builder
//!
//! Turns a tick-delta encoded, multi-track tempo map into a single queue of
//! absolute-time entries, each holding the notes that start together.

pub mod smf;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_TEMPO_US;

/// A note activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
}

/// One event inside a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEvent {
    NoteOn(NoteEvent),
    NoteOff(NoteEvent),
    /// Tempo change, microseconds per beat
    Tempo(u32),
    /// Anything the timeline does not care about
    Other,
}

/// A track event with its delta from the previous event in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub delta: u32,
    pub event: TrackEvent,
}

impl TimedEvent {
    pub fn new(delta: u32, event: TrackEvent) -> Self {
        Self { delta, event }
    }
}

/// Parsed timeline source: independent tracks sharing one tick resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TempoMap {
    pub ticks_per_beat: u16,
    pub tracks: Vec<Vec<TimedEvent>>,
}

/// Notes that start at (almost) the same moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Seconds from the start of the song
    pub time: f64,
    pub notes: Vec<NoteEvent>,
}

/// Time-ordered queue of timeline entries. Entries are only ever popped from the front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQueue {
    entries: VecDeque<TimelineEntry>,
}

impl EventQueue {
    pub fn new(entries: impl IntoIterator<Item = TimelineEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Queue with one single-note entry per time, for tests and demos
    pub fn from_times(times: &[f64]) -> Self {
        Self::new(times.iter().map(|&time| TimelineEntry {
            time,
            notes: vec![NoteEvent {
                channel: 0,
                note: 60,
                velocity: 100,
            }],
        }))
    }

    pub fn front(&self) -> Option<&TimelineEntry> {
        self.entries.front()
    }

    pub fn pop_front(&mut self) -> Option<TimelineEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seconds between the front entry and the one after it
    pub fn gap_after_front(&self) -> Option<f64> {
        match (self.entries.front(), self.entries.get(1)) {
            (Some(a), Some(b)) => Some(b.time - a.time),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter()
    }
}

/// Seconds for `ticks` at a fixed tempo in microseconds per beat
fn ticks_to_seconds(ticks: u64, ticks_per_beat: u16, tempo: u32) -> f64 {
    ticks as f64 * tempo as f64 / (ticks_per_beat.max(1) as f64 * 1_000_000.0)
}

/// Build the absolute-time event queue from a tempo map.
///
/// Tracks are scanned in order. The active tempo starts at 120 bpm, changes
/// where a tempo event is met, and carries over into the next track. Each
/// note's time is its accumulated tick count within its track converted at
/// the tempo active when the scan reaches it.
///
/// Only note-ons with positive velocity are kept. Output is deterministic:
/// events are stably sorted by time (ties keep track-then-event scan order),
/// then grouped when within `tolerance` seconds of a group's first event.
/// No qualifying notes yields an empty queue.
pub fn build_timeline(map: &TempoMap, tolerance: f64) -> EventQueue {
    let mut tempo = DEFAULT_TEMPO_US;
    let mut timed: Vec<(f64, NoteEvent)> = Vec::new();
    for track in &map.tracks {
        let mut tick = 0u64;
        for ev in track {
            tick += ev.delta as u64;
            match ev.event {
                TrackEvent::Tempo(t) => tempo = t,
                TrackEvent::NoteOn(note) if note.velocity > 0 => {
                    timed.push((ticks_to_seconds(tick, map.ticks_per_beat, tempo), note));
                }
                _ => {}
            }
        }
    }

    timed.sort_by(|a, b| a.0.total_cmp(&b.0));
    let queue = group_events(timed, tolerance);
    log::debug!("Timeline built: {} entries", queue.len());
    queue
}

/// Read a MIDI file and build its timeline
pub fn load_timeline(path: impl AsRef<std::path::Path>, tolerance: f64) -> crate::Result<EventQueue> {
    let path = path.as_ref();
    let map = smf::read_file(path)?;
    let queue = build_timeline(&map, tolerance);
    log::info!("Loaded {}: {} timeline entries", path.display(), queue.len());
    Ok(queue)
}

/// Group time-sorted notes into timeline entries
pub fn group_events(sorted: Vec<(f64, NoteEvent)>, tolerance: f64) -> EventQueue {
    // Absorbs float noise from tick conversion so a gap of exactly `tolerance` merges
    const EPS: f64 = 1e-9;

    let mut entries: Vec<TimelineEntry> = Vec::new();
    for (time, note) in sorted {
        match entries.last_mut() {
            Some(group) if (time - group.time).abs() <= tolerance + EPS => group.notes.push(note),
            _ => entries.push(TimelineEntry {
                time,
                notes: vec![note],
            }),
        }
    }
    EventQueue::new(entries)
}
