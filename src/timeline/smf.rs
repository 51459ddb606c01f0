//! Standard MIDI File loading
//!
//! Parsing is done by `midly`; this module only maps the parsed file onto a
//! [`TempoMap`]: tick resolution, tempo changes and note on/off. Everything
//! else becomes [`TrackEvent::Other`].

use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;

use super::{NoteEvent, TempoMap, TimedEvent, TrackEvent};

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("malformed MIDI file: {0}")]
    Parse(#[from] midly::Error),
    #[error("SMPTE time division is not supported")]
    SmpteDivision,
}

/// Parse SMF bytes into a tempo map
pub fn parse(data: &[u8]) -> Result<TempoMap, MidiError> {
    let smf = Smf::parse(data)?;
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(..) => return Err(MidiError::SmpteDivision),
    };

    let tracks: Vec<Vec<TimedEvent>> = smf
        .tracks
        .iter()
        .map(|track| {
            track
                .iter()
                .map(|ev| TimedEvent::new(ev.delta.as_int(), map_event(&ev.kind)))
                .collect()
        })
        .collect();

    log::debug!(
        "SMF {:?}: {} tracks at {} ticks per beat",
        smf.header.format,
        tracks.len(),
        ticks_per_beat
    );
    Ok(TempoMap {
        ticks_per_beat,
        tracks,
    })
}

fn map_event(kind: &TrackEventKind) -> TrackEvent {
    match *kind {
        TrackEventKind::Midi { channel, message } => match message {
            MidiMessage::NoteOn { key, vel } => TrackEvent::NoteOn(NoteEvent {
                channel: channel.as_int(),
                note: key.as_int(),
                velocity: vel.as_int(),
            }),
            MidiMessage::NoteOff { key, vel } => TrackEvent::NoteOff(NoteEvent {
                channel: channel.as_int(),
                note: key.as_int(),
                velocity: vel.as_int(),
            }),
            _ => TrackEvent::Other,
        },
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => TrackEvent::Tempo(tempo.as_int()),
        _ => TrackEvent::Other,
    }
}

/// Read and parse a MIDI file from disk
pub fn read_file(path: impl AsRef<Path>) -> crate::Result<TempoMap> {
    let data = std::fs::read(path)?;
    Ok(parse(&data)?)
}
