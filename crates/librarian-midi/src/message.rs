//! Recognition of received MIDI messages.

use crate::channel::MidiChannel;
use midi_msg::{ChannelVoiceMsg, ControlChange, MidiMsg};

/// A received message, reduced to the kinds that can trigger a patch recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingMessage {
    ProgramChange {
        channel: MidiChannel,
        program: u8,
    },
    ControlChange {
        channel: MidiChannel,
        controller: u8,
        value: u8,
    },
    /// Note On with non-zero velocity.
    NoteOn {
        channel: MidiChannel,
        note: u8,
        velocity: u8,
    },
    /// Anything else: note off, zero-velocity note on, pitch bend,
    /// pressure, system and SysEx messages, and bytes that do not parse.
    Other,
}

impl IncomingMessage {
    pub fn parse(bytes: &[u8]) -> Self {
        let msg = match MidiMsg::from_midi(bytes) {
            Ok((msg, _len)) => msg,
            Err(_) => return Self::Other,
        };

        let (channel, msg) = match msg {
            MidiMsg::ChannelVoice { channel, msg } => (channel, msg),
            // Controllers 120-127 are still controller events.
            MidiMsg::ChannelMode { channel, .. } => {
                return match MidiChannel::from_index(channel as u8) {
                    Ok(channel) => Self::raw_control_change(channel, bytes),
                    Err(_) => Self::Other,
                };
            }
            _ => return Self::Other,
        };

        let channel = match MidiChannel::from_index(channel as u8) {
            Ok(channel) => channel,
            Err(_) => return Self::Other,
        };

        match msg {
            ChannelVoiceMsg::ProgramChange { program } => Self::ProgramChange { channel, program },
            ChannelVoiceMsg::ControlChange { control } => match control {
                ControlChange::CC { control, value } => Self::ControlChange {
                    channel,
                    controller: control,
                    value,
                },
                // Named controllers: the raw data bytes are authoritative.
                _ => Self::raw_control_change(channel, bytes),
            },
            ChannelVoiceMsg::NoteOn { note, velocity } if velocity > 0 => Self::NoteOn {
                channel,
                note,
                velocity,
            },
            _ => Self::Other,
        }
    }

    fn raw_control_change(channel: MidiChannel, bytes: &[u8]) -> Self {
        match bytes {
            [_, controller, value, ..] => Self::ControlChange {
                channel,
                controller: *controller & 0x7F,
                value: *value & 0x7F,
            },
            _ => Self::Other,
        }
    }

    pub fn channel(&self) -> Option<MidiChannel> {
        match *self {
            Self::ProgramChange { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::NoteOn { channel, .. } => Some(channel),
            Self::Other => None,
        }
    }

    #[inline]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl From<&[u8]> for IncomingMessage {
    fn from(bytes: &[u8]) -> Self {
        Self::parse(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(display: u8) -> MidiChannel {
        MidiChannel::from_display(display).unwrap()
    }

    #[test]
    fn test_parse_program_change() {
        assert_eq!(
            IncomingMessage::parse(&[0xC0, 10]),
            IncomingMessage::ProgramChange {
                channel: ch(1),
                program: 10
            }
        );
        assert_eq!(
            IncomingMessage::parse(&[0xCF, 127]),
            IncomingMessage::ProgramChange {
                channel: ch(16),
                program: 127
            }
        );
    }

    #[test]
    fn test_parse_control_change() {
        assert_eq!(
            IncomingMessage::parse(&[0xB2, 7, 100]),
            IncomingMessage::ControlChange {
                channel: ch(3),
                controller: 7,
                value: 100
            }
        );
        assert_eq!(
            IncomingMessage::parse(&[0xB0, 0, 5]),
            IncomingMessage::ControlChange {
                channel: ch(1),
                controller: 0,
                value: 5
            }
        );
    }

    #[test]
    fn test_parse_channel_mode_controllers() {
        // All notes off
        assert_eq!(
            IncomingMessage::parse(&[0xB0, 123, 0]),
            IncomingMessage::ControlChange {
                channel: ch(1),
                controller: 123,
                value: 0
            }
        );
        // All sound off, channel 10
        assert_eq!(
            IncomingMessage::parse(&[0xB9, 120, 0]),
            IncomingMessage::ControlChange {
                channel: ch(10),
                controller: 120,
                value: 0
            }
        );
    }

    #[test]
    fn test_parse_note_on() {
        assert_eq!(
            IncomingMessage::parse(&[0x90, 60, 100]),
            IncomingMessage::NoteOn {
                channel: ch(1),
                note: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn test_unrecognized_messages() {
        // Zero-velocity note on is a note off
        assert_eq!(IncomingMessage::parse(&[0x90, 60, 0]), IncomingMessage::Other);
        assert_eq!(IncomingMessage::parse(&[0x80, 60, 64]), IncomingMessage::Other);
        assert_eq!(IncomingMessage::parse(&[0xE0, 0, 64]), IncomingMessage::Other);
        assert_eq!(IncomingMessage::parse(&[0xF8]), IncomingMessage::Other);
        assert_eq!(IncomingMessage::parse(&[]), IncomingMessage::Other);
        assert!(!IncomingMessage::parse(&[0xD0, 40]).is_recognized());
    }
}
