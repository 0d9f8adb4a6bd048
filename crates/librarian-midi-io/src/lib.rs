//! MIDI I/O subsystem for the patch librarian.
//!
//! Carries MIDI commands from the control thread to the real-time thread,
//! owns the physical port handles, and runs MIDI learn.
//!
//! - [`DeviceManager`]: command API, port selection, real-time drain entry point
//! - [`CommandQueue`]: bounded FIFO between control thread and real-time thread
//! - [`PortRegistry`]: open/close/refresh of one input and one output port
//! - [`LearnEngine`]: mapping table and learn-mode state machine
//!
//! Feature gates: `midi-io` (hardware ports via midir).

pub mod error;
pub use error::{Error, Result};

pub mod notify;
pub use notify::{Broadcaster, Subscription, SubscriptionId};

pub mod port;
pub use port::{
    InputCallback, InputConnection, MidiBackend, NullBackend, OutputConnection, PortDirection,
    PortRegistry, RefreshReport, VirtualBackend,
};

#[cfg(feature = "midi-io")]
pub use port::MidirBackend;

pub mod queue;
pub use queue::{CommandQueue, EventSink, QueuedCommand, DEFAULT_QUEUE_CAPACITY};

pub mod learn;
pub use learn::{
    LearnEngine, LearnEvent, LearnOutcome, LearnState, Mapping, MappingTable, MessageType,
    PatchSlot,
};

mod system;
pub use system::{
    DeviceEvent, DeviceManager, DeviceManagerBuilder, DrainHandle, HookId,
    DEFAULT_INCOMING_CAPACITY,
};

pub use librarian_midi::{codec, DeviceTemplate, EncodedMessage, IncomingMessage, MidiChannel};
