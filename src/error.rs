//! Crate error type
//!
//! Only external I/O and malformed input are errors. Gameplay dead-ends
//! (empty timeline, no legal placement) are outcomes, see `sim::Outcome`.

use thiserror::Error;

use crate::timeline::smf::MidiError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MIDI error: {0}")]
    Midi(#[from] MidiError),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
