//! Learned trigger mappings.

use crate::error::Error;
use librarian_midi::{IncomingMessage, MidiChannel};
use serde::{Deserialize, Serialize};

/// Index into the librarian's patch bank.
pub type PatchSlot = u32;

/// Kind of message a mapping listens for.
///
/// Serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageType {
    ProgramChange = 0,
    ControlChange = 1,
    NoteOn = 2,
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        match code {
            0 => Ok(Self::ProgramChange),
            1 => Ok(Self::ControlChange),
            2 => Ok(Self::NoteOn),
            other => Err(Error::InvalidRange(format!(
                "unknown message type code {}",
                other
            ))),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(message_type: MessageType) -> Self {
        message_type as u8
    }
}

/// Patch slot bound to one trigger message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub patch_slot: PatchSlot,
    pub message_type: MessageType,
    /// Serialized as 1-16.
    pub channel: MidiChannel,
    /// Program, controller or note number.
    pub data1: u8,
    /// Controller value or velocity; 0 for Program Change.
    pub data2: u8,
}

impl Mapping {
    pub fn new(
        patch_slot: PatchSlot,
        message_type: MessageType,
        channel: MidiChannel,
        data1: u8,
        data2: u8,
    ) -> Self {
        Self {
            patch_slot,
            message_type,
            channel,
            data1,
            data2,
        }
    }

    /// Capture `message` as the trigger for `patch_slot`.
    ///
    /// `None` for messages that cannot trigger anything.
    pub fn capture(patch_slot: PatchSlot, message: &IncomingMessage) -> Option<Self> {
        let (message_type, channel, data1, data2) = match *message {
            IncomingMessage::ProgramChange { channel, program } => {
                (MessageType::ProgramChange, channel, program, 0)
            }
            IncomingMessage::ControlChange {
                channel,
                controller,
                value,
            } => (MessageType::ControlChange, channel, controller, value),
            IncomingMessage::NoteOn {
                channel,
                note,
                velocity,
            } => (MessageType::NoteOn, channel, note, velocity),
            IncomingMessage::Other => return None,
        };
        Some(Self::new(patch_slot, message_type, channel, data1, data2))
    }

    /// Exact match on type, channel and data1. The value is compared only
    /// for Control Change; velocity never is.
    pub fn matches(&self, message: &IncomingMessage) -> bool {
        match *message {
            IncomingMessage::ProgramChange { channel, program } => {
                self.message_type == MessageType::ProgramChange
                    && self.channel == channel
                    && self.data1 == program
            }
            IncomingMessage::ControlChange {
                channel,
                controller,
                value,
            } => {
                self.message_type == MessageType::ControlChange
                    && self.channel == channel
                    && self.data1 == controller
                    && self.data2 == value
            }
            IncomingMessage::NoteOn { channel, note, .. } => {
                self.message_type == MessageType::NoteOn
                    && self.channel == channel
                    && self.data1 == note
            }
            IncomingMessage::Other => false,
        }
    }
}

/// The mapping list in insertion order, as handed to persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable(pub Vec<Mapping>);

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Mapping>> for MappingTable {
    fn from(mappings: Vec<Mapping>) -> Self {
        Self(mappings)
    }
}

impl IntoIterator for MappingTable {
    type Item = Mapping;
    type IntoIter = std::vec::IntoIter<Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(display: u8) -> MidiChannel {
        MidiChannel::from_display(display).unwrap()
    }

    #[test]
    fn test_capture() {
        let pc = IncomingMessage::ProgramChange {
            channel: ch(1),
            program: 10,
        };
        assert_eq!(
            Mapping::capture(5, &pc),
            Some(Mapping::new(5, MessageType::ProgramChange, ch(1), 10, 0))
        );

        let note = IncomingMessage::NoteOn {
            channel: ch(3),
            note: 60,
            velocity: 90,
        };
        assert_eq!(
            Mapping::capture(2, &note),
            Some(Mapping::new(2, MessageType::NoteOn, ch(3), 60, 90))
        );

        assert_eq!(Mapping::capture(1, &IncomingMessage::Other), None);
    }

    #[test]
    fn test_matches_program_change_ignores_data2() {
        let mapping = Mapping::new(0, MessageType::ProgramChange, ch(1), 10, 99);
        assert!(mapping.matches(&IncomingMessage::ProgramChange {
            channel: ch(1),
            program: 10
        }));
        assert!(!mapping.matches(&IncomingMessage::ProgramChange {
            channel: ch(1),
            program: 11
        }));
        assert!(!mapping.matches(&IncomingMessage::ProgramChange {
            channel: ch(2),
            program: 10
        }));
    }

    #[test]
    fn test_matches_control_change_requires_value() {
        let mapping = Mapping::new(0, MessageType::ControlChange, ch(1), 20, 127);
        let cc = |value| IncomingMessage::ControlChange {
            channel: ch(1),
            controller: 20,
            value,
        };
        assert!(mapping.matches(&cc(127)));
        assert!(!mapping.matches(&cc(0)));
    }

    #[test]
    fn test_matches_note_on_ignores_velocity() {
        let mapping = Mapping::new(0, MessageType::NoteOn, ch(10), 36, 100);
        assert!(mapping.matches(&IncomingMessage::NoteOn {
            channel: ch(10),
            note: 36,
            velocity: 1
        }));
        assert!(!mapping.matches(&IncomingMessage::ControlChange {
            channel: ch(10),
            controller: 36,
            value: 100
        }));
    }

    #[test]
    fn test_serialization_contract() {
        let mapping = Mapping::new(5, MessageType::ControlChange, ch(16), 7, 64);
        let json = serde_json::to_value(mapping).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "patchSlot": 5,
                "messageType": 1,
                "channel": 16,
                "data1": 7,
                "data2": 64
            })
        );

        let back: Mapping = serde_json::from_value(json).unwrap();
        assert_eq!(back, mapping);
    }

    #[test]
    fn test_deserialization_rejects_bad_codes() {
        let bad_type = r#"{"patchSlot":1,"messageType":7,"channel":1,"data1":0,"data2":0}"#;
        assert!(serde_json::from_str::<Mapping>(bad_type).is_err());

        let bad_channel = r#"{"patchSlot":1,"messageType":0,"channel":0,"data1":0,"data2":0}"#;
        assert!(serde_json::from_str::<Mapping>(bad_channel).is_err());
    }

    #[test]
    fn test_table_is_an_ordered_list() {
        let table = MappingTable(vec![
            Mapping::new(3, MessageType::ProgramChange, ch(1), 3, 0),
            Mapping::new(1, MessageType::NoteOn, ch(2), 40, 80),
        ]);
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.starts_with('['));
        let back: MappingTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.0[0].patch_slot, 3);
    }
}
