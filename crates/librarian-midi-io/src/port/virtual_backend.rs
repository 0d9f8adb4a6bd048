//! In-process MIDI ports.
//!
//! Port names can be added and removed at any time to simulate hot-plug.
//! Bytes written to an output are recorded; bytes injected into an input
//! are delivered to its callback on the injecting thread, the same way a
//! driver thread would deliver them.

use super::backend::{InputCallback, InputConnection, MidiBackend, OutputConnection};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type SharedCallback = Arc<Mutex<InputCallback>>;

#[derive(Default)]
struct VirtualState {
    outputs: Vec<String>,
    inputs: Vec<String>,
    failing: HashSet<String>,
    /// Writes each output still accepts before failing.
    write_limits: HashMap<String, usize>,
    sent: HashMap<String, Vec<Vec<u8>>>,
    /// Open inputs, keyed by port name, tagged with the connection id.
    listeners: HashMap<String, (u64, SharedCallback)>,
    next_connection: u64,
}

#[derive(Default, Clone)]
pub struct VirtualBackend {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_output_port(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.state.lock();
        if !state.outputs.contains(&name) {
            state.outputs.push(name);
        }
    }

    pub fn remove_output_port(&self, name: &str) {
        self.state.lock().outputs.retain(|n| n != name);
    }

    pub fn add_input_port(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.state.lock();
        if !state.inputs.contains(&name) {
            state.inputs.push(name);
        }
    }

    /// Removing an input also silences any open connection to it.
    pub fn remove_input_port(&self, name: &str) {
        let mut state = self.state.lock();
        state.inputs.retain(|n| n != name);
        state.listeners.remove(name);
    }

    /// Make the next opens of `name` (either direction) fail.
    pub fn set_open_failure(&self, name: &str, fail: bool) {
        let mut state = self.state.lock();
        if fail {
            state.failing.insert(name.to_string());
        } else {
            state.failing.remove(name);
        }
    }

    /// Let `limit` more writes to the output `name` succeed, then fail
    /// every write after them. `None` lifts the limit.
    pub fn set_write_limit(&self, name: &str, limit: Option<usize>) {
        let mut state = self.state.lock();
        match limit {
            Some(limit) => {
                state.write_limits.insert(name.to_string(), limit);
            }
            None => {
                state.write_limits.remove(name);
            }
        }
    }

    /// Deliver `bytes` to the open input named `name`.
    ///
    /// Returns `false` when no connection is listening.
    pub fn inject(&self, name: &str, bytes: &[u8]) -> bool {
        let callback = {
            let state = self.state.lock();
            match state.listeners.get(name) {
                Some((_, callback)) => Arc::clone(callback),
                None => return false,
            }
        };
        let mut callback = callback.lock();
        (*callback)(bytes);
        true
    }

    /// Everything written to the output named `name`, oldest first.
    pub fn sent_messages(&self, name: &str) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .sent
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }

    pub fn is_input_listening(&self, name: &str) -> bool {
        self.state.lock().listeners.contains_key(name)
    }
}

impl MidiBackend for VirtualBackend {
    fn output_port_names(&self) -> Vec<String> {
        self.state.lock().outputs.clone()
    }

    fn input_port_names(&self) -> Vec<String> {
        self.state.lock().inputs.clone()
    }

    fn open_output(&self, name: &str) -> Result<Box<dyn OutputConnection>> {
        let state = self.state.lock();
        if !state.outputs.iter().any(|n| n == name) {
            return Err(Error::PortNotFound(name.to_string()));
        }
        if state.failing.contains(name) {
            return Err(Error::OpenFailed(name.to_string()));
        }
        Ok(Box::new(VirtualOutput {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }

    fn open_input(&self, name: &str, callback: InputCallback) -> Result<Box<dyn InputConnection>> {
        let mut state = self.state.lock();
        if !state.inputs.iter().any(|n| n == name) {
            return Err(Error::PortNotFound(name.to_string()));
        }
        if state.failing.contains(name) {
            return Err(Error::OpenFailed(name.to_string()));
        }
        state.next_connection += 1;
        let id = state.next_connection;
        state
            .listeners
            .insert(name.to_string(), (id, Arc::new(Mutex::new(callback))));
        Ok(Box::new(VirtualInput {
            id,
            name: name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

impl std::fmt::Debug for VirtualBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VirtualBackend")
            .field("outputs", &state.outputs)
            .field("inputs", &state.inputs)
            .finish()
    }
}

struct VirtualOutput {
    name: String,
    state: Arc<Mutex<VirtualState>>,
}

impl OutputConnection for VirtualOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if !state.outputs.iter().any(|n| n == &self.name) {
            return Err(Error::Backend(format!("{} is no longer available", self.name)));
        }
        if let Some(remaining) = state.write_limits.get_mut(&self.name) {
            if *remaining == 0 {
                return Err(Error::Backend(format!("{} rejected the write", self.name)));
            }
            *remaining -= 1;
        }
        state
            .sent
            .entry(self.name.clone())
            .or_default()
            .push(bytes.to_vec());
        Ok(())
    }
}

struct VirtualInput {
    id: u64,
    name: String,
    state: Arc<Mutex<VirtualState>>,
}

impl InputConnection for VirtualInput {}

impl Drop for VirtualInput {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        // A later connection to the same name may have replaced this one.
        if matches!(state.listeners.get(&self.name), Some((id, _)) if *id == self.id) {
            state.listeners.remove(&self.name);
        }
    }
}
