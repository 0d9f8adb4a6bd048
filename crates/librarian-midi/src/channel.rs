//! MIDI channel numbering.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A MIDI channel.
///
/// Users see channels as 1-16; the wire uses 0-15 in the low nibble of the
/// status byte. Stored as the wire index.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct MidiChannel(u8);

impl MidiChannel {
    pub const MIN_DISPLAY: u8 = 1;
    pub const MAX_DISPLAY: u8 = 16;

    /// Channel from its user-facing number (1-16).
    pub fn from_display(channel: u8) -> Result<Self> {
        if (Self::MIN_DISPLAY..=Self::MAX_DISPLAY).contains(&channel) {
            Ok(Self(channel - 1))
        } else {
            Err(Error::InvalidRange(format!(
                "MIDI channel must be 1-16, got {}",
                channel
            )))
        }
    }

    /// Channel from its wire index (0-15).
    pub fn from_index(index: u8) -> Result<Self> {
        if index <= 15 {
            Ok(Self(index))
        } else {
            Err(Error::InvalidRange(format!(
                "MIDI channel index must be 0-15, got {}",
                index
            )))
        }
    }

    /// User-facing number (1-16).
    #[inline]
    pub fn display(self) -> u8 {
        self.0 + 1
    }

    /// Wire index (0-15).
    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MidiChannel {
    type Error = Error;

    /// Interprets the value as a display number (1-16).
    fn try_from(channel: u8) -> Result<Self> {
        Self::from_display(channel)
    }
}

impl From<MidiChannel> for u8 {
    fn from(channel: MidiChannel) -> Self {
        channel.display()
    }
}

impl fmt::Display for MidiChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_to_index() {
        assert_eq!(MidiChannel::from_display(1).unwrap().index(), 0);
        assert_eq!(MidiChannel::from_display(16).unwrap().index(), 15);
        assert_eq!(MidiChannel::from_display(10).unwrap().display(), 10);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            MidiChannel::from_display(0),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            MidiChannel::from_display(17),
            Err(Error::InvalidRange(_))
        ));
        assert!(MidiChannel::from_index(16).is_err());
    }

    #[test]
    fn test_serde_uses_display_number() {
        let channel = MidiChannel::from_display(3).unwrap();
        assert_eq!(serde_json::to_string(&channel).unwrap(), "3");

        let parsed: MidiChannel = serde_json::from_str("16").unwrap();
        assert_eq!(parsed.index(), 15);

        assert!(serde_json::from_str::<MidiChannel>("0").is_err());
    }
}
