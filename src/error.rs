//! Centralized error type for the librarian umbrella crate.
//!
//! Wraps both subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("MIDI: {0}")]
    Midi(#[from] librarian_midi::Error),

    #[error("MIDI device: {0}")]
    Device(#[from] librarian_midi_io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
