//! Error types for MIDI encoding and validation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Value out of range: {0}")]
    InvalidRange(String),

    #[error("Invalid SysEx: {0}")]
    InvalidSysEx(String),
}

pub type Result<T> = std::result::Result<T, Error>;
