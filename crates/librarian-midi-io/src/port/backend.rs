//! Seams between the port registry and a MIDI driver.

use crate::error::{Error, Result};
use std::fmt;

/// Input and output ports live in independent namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// Called with each raw message received on an open input.
///
/// Runs on the driver's thread, never on the control thread.
pub type InputCallback = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// An open output. Closed when dropped.
pub trait OutputConnection: Send {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// An open input. Closed when dropped.
pub trait InputConnection: Send {}

pub trait MidiBackend: Send + Sync {
    fn output_port_names(&self) -> Vec<String>;

    fn input_port_names(&self) -> Vec<String>;

    fn open_output(&self, name: &str) -> Result<Box<dyn OutputConnection>>;

    fn open_input(&self, name: &str, callback: InputCallback) -> Result<Box<dyn InputConnection>>;

    fn port_names(&self, direction: PortDirection) -> Vec<String> {
        match direction {
            PortDirection::Input => self.input_port_names(),
            PortDirection::Output => self.output_port_names(),
        }
    }
}

/// A backend with no ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl MidiBackend for NullBackend {
    fn output_port_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn input_port_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn open_output(&self, name: &str) -> Result<Box<dyn OutputConnection>> {
        Err(Error::PortNotFound(name.to_string()))
    }

    fn open_input(&self, name: &str, _callback: InputCallback) -> Result<Box<dyn InputConnection>> {
        Err(Error::PortNotFound(name.to_string()))
    }
}
