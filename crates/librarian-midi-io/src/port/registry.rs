//! Open/close/refresh of one output and one input port.
//!
//! Per direction: `Closed -> (open) -> Open -> (close | vanished) -> Closed`.
//! Reopening after a disconnection is always the caller's decision.

use super::backend::{InputCallback, InputConnection, MidiBackend, OutputConnection, PortDirection};
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct OpenPort<C> {
    name: String,
    connection: C,
}

/// One direction's handle plus what `refresh()` needs to remember.
struct PortSlot<C> {
    open: Option<OpenPort<C>>,
    /// Name of the port that was open when the device vanished.
    lost_name: Option<String>,
    /// Whether `lost_name` was absent on the latest refresh.
    lost_missing: bool,
}

impl<C> PortSlot<C> {
    fn new() -> Self {
        Self {
            open: None,
            lost_name: None,
            lost_missing: false,
        }
    }

    fn name(&self) -> Option<&str> {
        self.open.as_ref().map(|port| port.name.as_str())
    }

    fn is_open_on(&self, name: &str) -> bool {
        self.name() == Some(name)
    }

    fn close(&mut self, direction: PortDirection) {
        if let Some(port) = self.open.take() {
            debug!("Closed MIDI {} port: {}", direction, port.name);
        }
        self.lost_name = None;
        self.lost_missing = false;
    }

    fn install(&mut self, name: &str, connection: C) {
        self.open = Some(OpenPort {
            name: name.to_string(),
            connection,
        });
        self.lost_name = None;
        self.lost_missing = false;
    }

    /// Returns `(disconnected, available_again)`.
    fn refresh(
        &mut self,
        direction: PortDirection,
        available: &[String],
    ) -> (Option<String>, Option<String>) {
        let present = |name: &str| available.iter().any(|n| n == name);

        let open_name = self.name().map(str::to_string);
        if let Some(name) = open_name {
            if present(&name) {
                return (None, None);
            }
            self.open = None;
            self.lost_name = Some(name.clone());
            self.lost_missing = true;
            warn!("MIDI {} port disconnected: {}", direction, name);
            return (Some(name), None);
        }

        let Some(name) = self.lost_name.clone() else {
            return (None, None);
        };
        if !present(&name) {
            self.lost_missing = true;
            return (None, None);
        }
        if self.lost_missing {
            self.lost_missing = false;
            info!("MIDI {} port available again: {}", direction, name);
            return (None, Some(name));
        }
        (None, None)
    }
}

/// What changed during one [`PortRegistry::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub output_disconnected: Option<String>,
    pub input_disconnected: Option<String>,
    /// The output lost earlier is enumerable again. It is not reopened.
    pub output_available_again: Option<String>,
    /// The input lost earlier is enumerable again. It is not reopened.
    pub input_available_again: Option<String>,
}

impl RefreshReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Exclusive owner of the open port handles.
///
/// A handle is released when its port is closed, replaced, or found missing
/// by [`refresh`](Self::refresh). Not thread-safe on its own; the device
/// manager keeps it behind its device lock.
pub struct PortRegistry {
    backend: Arc<dyn MidiBackend>,
    output: PortSlot<Box<dyn OutputConnection>>,
    input: PortSlot<Box<dyn InputConnection>>,
}

impl PortRegistry {
    pub fn new(backend: Arc<dyn MidiBackend>) -> Self {
        Self {
            backend,
            output: PortSlot::new(),
            input: PortSlot::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn MidiBackend> {
        &self.backend
    }

    pub fn available_output_ports(&self) -> Vec<String> {
        self.backend.output_port_names()
    }

    pub fn available_input_ports(&self) -> Vec<String> {
        self.backend.input_port_names()
    }

    /// Open the output named `name`.
    ///
    /// An empty name closes the output. The same name as the open port is a
    /// no-op. A name that is not enumerable fails with `PortNotFound` and
    /// leaves the current port open. Otherwise the current port is closed
    /// first; if the driver then refuses, the output stays closed.
    pub fn open_output(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            self.close_output();
            return Ok(());
        }
        if self.output.is_open_on(name) {
            return Ok(());
        }
        if !self.available_output_ports().iter().any(|n| n == name) {
            return Err(Error::PortNotFound(name.to_string()));
        }

        self.output.close(PortDirection::Output);
        let connection = self
            .backend
            .open_output(name)
            .map_err(|e| open_failed(name, e))?;
        self.output.install(name, connection);
        info!("Opened MIDI output port: {}", name);
        Ok(())
    }

    /// Open the input named `name`, delivering messages to `callback`.
    ///
    /// Same rules as [`open_output`](Self::open_output). When `name` is
    /// already open, `callback` is dropped and the existing one stays.
    pub fn open_input(&mut self, name: &str, callback: InputCallback) -> Result<()> {
        if name.is_empty() {
            self.close_input();
            return Ok(());
        }
        if self.input.is_open_on(name) {
            return Ok(());
        }
        if !self.available_input_ports().iter().any(|n| n == name) {
            return Err(Error::PortNotFound(name.to_string()));
        }

        self.input.close(PortDirection::Input);
        let connection = self
            .backend
            .open_input(name, callback)
            .map_err(|e| open_failed(name, e))?;
        self.input.install(name, connection);
        info!("Opened MIDI input port: {}", name);
        Ok(())
    }

    /// Idempotent.
    pub fn close_output(&mut self) {
        self.output.close(PortDirection::Output);
    }

    /// Idempotent.
    pub fn close_input(&mut self) {
        self.input.close(PortDirection::Input);
    }

    /// Close any open port whose name is no longer enumerable.
    ///
    /// Never opens anything.
    pub fn refresh(&mut self) -> RefreshReport {
        let outputs = self.backend.output_port_names();
        let inputs = self.backend.input_port_names();
        let (output_disconnected, output_available_again) =
            self.output.refresh(PortDirection::Output, &outputs);
        let (input_disconnected, input_available_again) =
            self.input.refresh(PortDirection::Input, &inputs);
        RefreshReport {
            output_disconnected,
            input_disconnected,
            output_available_again,
            input_available_again,
        }
    }

    pub fn is_output_open(&self) -> bool {
        self.output.open.is_some()
    }

    pub fn is_input_open(&self) -> bool {
        self.input.open.is_some()
    }

    pub fn current_output_name(&self) -> Option<&str> {
        self.output.name()
    }

    pub fn current_input_name(&self) -> Option<&str> {
        self.input.name()
    }

    /// Write straight to the open output. Control thread only.
    pub fn write_output(&mut self, bytes: &[u8]) -> Result<()> {
        match self.output.open.as_mut() {
            Some(port) => port.connection.send(bytes),
            None => Err(Error::OpenFailed("no MIDI output port is open".to_string())),
        }
    }
}

impl std::fmt::Debug for PortRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortRegistry")
            .field("output", &self.output.name())
            .field("input", &self.input.name())
            .finish()
    }
}

fn open_failed(name: &str, e: Error) -> Error {
    match e {
        Error::OpenFailed(msg) => Error::OpenFailed(msg),
        other => Error::OpenFailed(format!("{}: {}", name, other)),
    }
}
