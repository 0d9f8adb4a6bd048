//! MIDI learn: bind a controller gesture to a patch slot, then recall the
//! slot whenever the same gesture arrives again.

mod engine;
mod mapping;

pub use engine::{LearnEngine, LearnEvent, LearnOutcome, LearnState};
pub use mapping::{Mapping, MappingTable, MessageType, PatchSlot};
