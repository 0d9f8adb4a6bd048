//! MIDI port lifecycle.
//!
//! [`PortRegistry`] owns at most one open input and one open output, each
//! addressed by name. Backends supply enumeration and connections:
//! [`VirtualBackend`] for in-process ports, [`MidirBackend`] for hardware
//! (feature `midi-io`).

mod backend;
mod registry;
mod virtual_backend;

#[cfg(feature = "midi-io")]
mod midir_backend;

pub use backend::{
    InputCallback, InputConnection, MidiBackend, NullBackend, OutputConnection, PortDirection,
};
pub use registry::{PortRegistry, RefreshReport};
pub use virtual_backend::VirtualBackend;

#[cfg(feature = "midi-io")]
pub use midir_backend::MidirBackend;
