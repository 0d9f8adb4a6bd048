//! MIDI message encoding.
//!
//! Every encoder validates its inputs before producing a single byte; on
//! failure nothing is returned but the error. Channels are given in display
//! numbering (1-16).

use crate::channel::MidiChannel;
use crate::error::{Error, Result};
use smallvec::SmallVec;

pub const STATUS_CONTROL_CHANGE: u8 = 0xB0;
pub const STATUS_PROGRAM_CHANGE: u8 = 0xC0;
pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

/// Bank Select MSB controller number.
pub const CC_BANK_SELECT_MSB: u8 = 0;
/// Bank Select LSB controller number.
pub const CC_BANK_SELECT_LSB: u8 = 32;

/// Exact wire bytes of one encoded message.
///
/// Channel messages stay inline; SysEx spills to the heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    bytes: SmallVec<[u8; 3]>,
}

impl EncodedMessage {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into_vec()
    }

    #[inline]
    pub fn status(&self) -> u8 {
        self.bytes[0]
    }
}

impl AsRef<[u8]> for EncodedMessage {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn data_byte(name: &str, value: u8) -> Result<u8> {
    if value <= 0x7F {
        Ok(value)
    } else {
        Err(Error::InvalidRange(format!(
            "{} must be 0-127, got {}",
            name, value
        )))
    }
}

pub fn encode_program_change(channel: u8, program: u8) -> Result<EncodedMessage> {
    let channel = MidiChannel::from_display(channel)?;
    let program = data_byte("Program number", program)?;
    Ok(EncodedMessage {
        bytes: SmallVec::from_slice(&[STATUS_PROGRAM_CHANGE | channel.index(), program]),
    })
}

pub fn encode_control_change(channel: u8, controller: u8, value: u8) -> Result<EncodedMessage> {
    let channel = MidiChannel::from_display(channel)?;
    let controller = data_byte("Controller number", controller)?;
    let value = data_byte("Control value", value)?;
    Ok(EncodedMessage {
        bytes: SmallVec::from_slice(&[STATUS_CONTROL_CHANGE | channel.index(), controller, value]),
    })
}

/// Bank Select as a single Control Change: CC#0 when `use_msb`, CC#32 otherwise.
pub fn encode_bank_select(channel: u8, bank: u8, use_msb: bool) -> Result<EncodedMessage> {
    let bank = data_byte("Bank number", bank)?;
    let controller = if use_msb {
        CC_BANK_SELECT_MSB
    } else {
        CC_BANK_SELECT_LSB
    };
    encode_control_change(channel, controller, bank)
}

/// SysEx from a payload.
///
/// A bare payload is framed with `F0 .. F7`. A payload that is already framed
/// is taken as-is. Interior bytes must be 7-bit data.
pub fn encode_sysex(data: &[u8]) -> Result<EncodedMessage> {
    let payload = match data {
        [] => return Err(Error::InvalidSysEx("SysEx payload is empty".to_string())),
        [SYSEX_START, inner @ .., SYSEX_END] => inner,
        [SYSEX_START, ..] => {
            return Err(Error::InvalidSysEx(
                "SysEx payload starts with F0 but is not terminated by F7".to_string(),
            ))
        }
        _ => data,
    };

    if payload.is_empty() {
        return Err(Error::InvalidSysEx("SysEx payload is empty".to_string()));
    }

    if let Some((pos, byte)) = payload.iter().enumerate().find(|(_, b)| **b > 0x7F) {
        return Err(Error::InvalidSysEx(format!(
            "SysEx data byte {} is 0x{:02X}; data bytes must be 0x00-0x7F",
            pos, byte
        )));
    }

    let mut bytes = SmallVec::with_capacity(payload.len() + 2);
    bytes.push(SYSEX_START);
    bytes.extend_from_slice(payload);
    bytes.push(SYSEX_END);
    Ok(EncodedMessage { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_change_all_channels() {
        for channel in 1..=16u8 {
            for program in [0u8, 1, 64, 127] {
                let msg = encode_program_change(channel, program).unwrap();
                assert_eq!(msg.len(), 2);
                assert_eq!(msg.status() & 0xF0, STATUS_PROGRAM_CHANGE);
                assert_eq!(msg.status() & 0x0F, channel - 1);
                assert_eq!(msg.as_bytes()[1], program);
            }
        }
    }

    #[test]
    fn test_program_change_out_of_range() {
        assert!(matches!(
            encode_program_change(1, 128),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            encode_program_change(0, 10),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            encode_program_change(17, 10),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_control_change() {
        let msg = encode_control_change(1, 7, 127).unwrap();
        assert_eq!(msg.as_bytes(), &[0xB0, 7, 127]);

        let msg = encode_control_change(16, 64, 0).unwrap();
        assert_eq!(msg.as_bytes(), &[0xBF, 64, 0]);

        assert!(encode_control_change(1, 128, 0).is_err());
        assert!(encode_control_change(1, 0, 200).is_err());
    }

    #[test]
    fn test_bank_select_msb_lsb() {
        let msb = encode_bank_select(1, 64, true).unwrap();
        assert_eq!(msb.as_bytes(), &[0xB0, 0, 64]);

        let lsb = encode_bank_select(1, 64, false).unwrap();
        assert_eq!(lsb.as_bytes(), &[0xB0, 32, 64]);

        assert!(matches!(
            encode_bank_select(1, 128, true),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_sysex_framing() {
        let msg = encode_sysex(&[0x43, 0x10, 0x01]).unwrap();
        assert_eq!(msg.as_bytes(), &[0xF0, 0x43, 0x10, 0x01, 0xF7]);

        let framed = encode_sysex(&[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]).unwrap();
        assert_eq!(framed.as_bytes(), &[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]);
    }

    #[test]
    fn test_sysex_rejects_bad_payloads() {
        assert!(matches!(encode_sysex(&[]), Err(Error::InvalidSysEx(_))));
        assert!(matches!(
            encode_sysex(&[0xF0, 0xF7]),
            Err(Error::InvalidSysEx(_))
        ));
        assert!(matches!(
            encode_sysex(&[0xF0, 0x43, 0x10]),
            Err(Error::InvalidSysEx(_))
        ));
        assert!(matches!(
            encode_sysex(&[0x43, 0x90, 0x01]),
            Err(Error::InvalidSysEx(_))
        ));
    }
}
