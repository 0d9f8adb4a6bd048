//! Error types for the MIDI I/O subsystem.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("MIDI port not found: {0}")]
    PortNotFound(String),

    #[error("MIDI port could not be opened: {0}")]
    OpenFailed(String),

    #[error("MIDI output queue full")]
    QueueFull,

    #[error("Value out of range: {0}")]
    InvalidRange(String),

    #[error("Invalid SysEx: {0}")]
    InvalidSysEx(String),

    #[error("MIDI backend error: {0}")]
    Backend(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<librarian_midi::Error> for Error {
    fn from(e: librarian_midi::Error) -> Self {
        match e {
            librarian_midi::Error::InvalidRange(msg) => Error::InvalidRange(msg),
            librarian_midi::Error::InvalidSysEx(msg) => Error::InvalidSysEx(msg),
        }
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::Backend(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::OpenFailed(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::OpenFailed(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::SendError> for Error {
    fn from(e: midir::SendError) -> Self {
        Error::Backend(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
