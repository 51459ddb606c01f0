//! Backing-track control
//!
//! The core only needs start/pause/resume/stop, time-correlated with its own
//! pause accounting. Decoding and output belong to whatever implements
//! `AudioSink`.

use std::path::{Path, PathBuf};

use crate::Result;

/// Transport state of the backing track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Something that can loop a backing track
pub trait AudioSink {
    /// Load `path` and start looping it. Missing or unreadable files are errors.
    fn load_and_loop(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
}

/// Tracks transport state and validates the track file, but plays nothing.
/// Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct SilentAudio {
    track: Option<PathBuf>,
    transport: Transport,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn track(&self) -> Option<&Path> {
        self.track.as_deref()
    }
}

impl AudioSink for SilentAudio {
    fn load_and_loop(&mut self, path: &Path) -> Result<()> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            )
            .into());
        }
        log::info!("Looping {} ({} bytes)", path.display(), meta.len());
        self.track = Some(path.to_path_buf());
        self.transport = Transport::Playing;
        Ok(())
    }

    fn pause(&mut self) {
        if self.transport == Transport::Playing {
            log::debug!("Audio paused");
            self.transport = Transport::Paused;
        }
    }

    fn resume(&mut self) {
        if self.transport == Transport::Paused {
            log::debug!("Audio resumed");
            self.transport = Transport::Playing;
        }
    }

    fn stop(&mut self) {
        if self.transport != Transport::Stopped {
            log::debug!("Audio stopped");
        }
        self.transport = Transport::Stopped;
    }
}
