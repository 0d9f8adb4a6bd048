//! Hardware ports via midir.

use super::backend::{InputCallback, InputConnection, MidiBackend, OutputConnection};
use crate::error::{Error, Result};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::warn;

/// Opens hardware ports by exact name.
///
/// A fresh midir client is created per enumeration and per connection, so
/// the backend itself holds no driver state.
#[derive(Debug, Clone)]
pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

impl Default for MidirBackend {
    fn default() -> Self {
        Self::new("librarian")
    }
}

impl MidiBackend for MidirBackend {
    fn output_port_names(&self) -> Vec<String> {
        match MidiOutput::new(&format!("{}-list", self.client_name)) {
            Ok(midi_output) => midi_output
                .ports()
                .iter()
                .filter_map(|port| midi_output.port_name(port).ok())
                .collect(),
            Err(e) => {
                warn!("Cannot enumerate MIDI outputs: {}", e);
                Vec::new()
            }
        }
    }

    fn input_port_names(&self) -> Vec<String> {
        match MidiInput::new(&format!("{}-list", self.client_name)) {
            Ok(midi_input) => midi_input
                .ports()
                .iter()
                .filter_map(|port| midi_input.port_name(port).ok())
                .collect(),
            Err(e) => {
                warn!("Cannot enumerate MIDI inputs: {}", e);
                Vec::new()
            }
        }
    }

    fn open_output(&self, name: &str) -> Result<Box<dyn OutputConnection>> {
        let midi_output = MidiOutput::new(&self.client_name)?;
        let port = midi_output
            .ports()
            .into_iter()
            .find(|port| midi_output.port_name(port).map_or(false, |n| n == name))
            .ok_or_else(|| Error::PortNotFound(name.to_string()))?;

        let connection = midi_output.connect(&port, &format!("{}-out", self.client_name))?;
        Ok(Box::new(MidirOutput { connection }))
    }

    fn open_input(
        &self,
        name: &str,
        mut callback: InputCallback,
    ) -> Result<Box<dyn InputConnection>> {
        let midi_input = MidiInput::new(&self.client_name)?;
        let port = midi_input
            .ports()
            .into_iter()
            .find(|port| midi_input.port_name(port).map_or(false, |n| n == name))
            .ok_or_else(|| Error::PortNotFound(name.to_string()))?;

        let connection = midi_input.connect(
            &port,
            &format!("{}-in", self.client_name),
            move |_timestamp, message, _| callback(message),
            (),
        )?;
        Ok(Box::new(MidirInput {
            _connection: connection,
        }))
    }
}

struct MidirOutput {
    connection: MidiOutputConnection,
}

impl OutputConnection for MidirOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.connection.send(bytes)?;
        Ok(())
    }
}

struct MidirInput {
    _connection: MidiInputConnection<()>,
}

impl InputConnection for MidirInput {}
