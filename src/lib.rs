//! # Librarian - Hardware Synth Patch Librarian
//!
//! MIDI side of a patch librarian, built from two subsystems.
//!
//! ## Architecture
//!
//! Librarian is an umbrella crate that coordinates:
//! - **librarian-midi** - MIDI vocabulary (channels, message codec, incoming
//!   message recognition, device templates)
//! - **librarian-midi-io** - MIDI I/O (ports, real-time command queue,
//!   MIDI learn, device manager)
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use librarian::prelude::*;
//!
//! let backend = VirtualBackend::new();
//! backend.add_output_port("Synth");
//! backend.add_input_port("Controller");
//!
//! let librarian = Librarian::builder()
//!     .backend(Arc::new(backend.clone()))
//!     .build()?;
//! librarian.device().set_output_port("Synth")?;
//! librarian.device().set_input_port("Controller")?;
//!
//! // Bind the next controller gesture to patch slot 5.
//! librarian.learn().start_learning(5);
//! backend.inject("Controller", &[0xC0, 10]);
//! librarian.poll();
//!
//! // The same gesture now recalls slot 5.
//! backend.inject("Controller", &[0xC0, 10]);
//! assert_eq!(librarian.poll().recalls, vec![5]);
//! # Ok::<(), librarian::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `midi-io` - Hardware MIDI ports via midir

/// Re-export of librarian-midi for direct access
pub use librarian_midi as midi;

/// Re-export of librarian-midi-io for direct access
pub use librarian_midi_io as io;

pub use librarian_midi::{codec, DeviceTemplate, EncodedMessage, IncomingMessage, MidiChannel};
pub use librarian_midi_io::{
    CommandQueue, DeviceEvent, DeviceManager, DeviceManagerBuilder, DrainHandle, EventSink,
    LearnEngine, LearnEvent, LearnOutcome, LearnState, Mapping, MappingTable, MessageType,
    MidiBackend, NullBackend, PatchSlot, PortRegistry, RefreshReport, VirtualBackend,
};

#[cfg(feature = "midi-io")]
pub use librarian_midi_io::MidirBackend;

mod error;
pub use error::{Error, Result};

mod builder;
mod engine;

pub use builder::LibrarianBuilder;
pub use engine::{Librarian, PollReport};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Librarian, LibrarianBuilder, PollReport};

    // Device
    pub use crate::{DeviceManager, DeviceTemplate, DrainHandle, EventSink, MidiChannel};

    // Learn
    pub use crate::{LearnEngine, LearnOutcome, Mapping, MappingTable, MessageType, PatchSlot};

    // Ports
    pub use crate::{MidiBackend, VirtualBackend};

    #[cfg(feature = "midi-io")]
    pub use crate::MidirBackend;
}
