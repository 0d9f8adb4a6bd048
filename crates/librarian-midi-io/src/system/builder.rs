//! DeviceManager builder.

use std::sync::Arc;

use librarian_midi::{DeviceTemplate, MidiChannel};

use crate::error::{Error, Result};
use crate::port::{MidiBackend, NullBackend, PortRegistry};
use crate::queue::{CommandQueue, DEFAULT_QUEUE_CAPACITY};

#[cfg(feature = "midi-io")]
use crate::port::MidirBackend;

use super::DeviceManager;

pub const DEFAULT_INCOMING_CAPACITY: usize = 1024;

pub struct DeviceManagerBuilder {
    pub(super) backend: Option<Arc<dyn MidiBackend>>,
    pub(super) queue_capacity: usize,
    pub(super) incoming_capacity: usize,
    /// `None` = the template's default channel.
    pub(super) channel: Option<u8>,
    pub(super) template: Option<DeviceTemplate>,
}

impl Default for DeviceManagerBuilder {
    fn default() -> Self {
        Self {
            backend: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            incoming_capacity: DEFAULT_INCOMING_CAPACITY,
            channel: None,
            template: None,
        }
    }
}

impl DeviceManagerBuilder {
    /// Port driver. Without one the manager sees no ports.
    pub fn backend(mut self, backend: Arc<dyn MidiBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Hardware ports through midir.
    #[cfg(feature = "midi-io")]
    pub fn io(mut self, client_name: impl Into<String>) -> Self {
        self.backend = Some(Arc::new(MidirBackend::new(client_name)));
        self
    }

    /// Commands the real-time queue can hold.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Received messages held until the next `pump_incoming`.
    pub fn incoming_capacity(mut self, capacity: usize) -> Self {
        self.incoming_capacity = capacity;
        self
    }

    /// Initial output channel (1-16).
    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn template(mut self, template: DeviceTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn build(self) -> Result<DeviceManager> {
        let queue = CommandQueue::try_new(self.queue_capacity)?;
        if self.incoming_capacity == 0 {
            return Err(Error::InvalidConfig(
                "incoming capacity must be at least 1".to_string(),
            ));
        }

        let template = self.template.unwrap_or_default();
        let channel = match self.channel {
            Some(channel) => MidiChannel::from_display(channel)?,
            None => template.default_channel(),
        };
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(NullBackend) as Arc<dyn MidiBackend>);

        Ok(DeviceManager::from_parts(
            PortRegistry::new(backend),
            channel,
            template,
            queue,
            self.incoming_capacity,
        ))
    }
}
