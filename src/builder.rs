//! Builder for configuring and constructing a `Librarian`.

use crate::{Librarian, Result};
use librarian_midi_io::{DeviceManager, DeviceTemplate, LearnEngine, MappingTable, MidiBackend};
use std::sync::Arc;

/// # Example
///
/// ```
/// use std::sync::Arc;
/// use librarian::prelude::*;
///
/// let backend = VirtualBackend::new();
/// backend.add_output_port("JV-1080");
///
/// let librarian = Librarian::builder()
///     .backend(Arc::new(backend))
///     .template(DeviceTemplate::roland_jv1080())
///     .build()?;
/// librarian.device().set_output_port("JV-1080")?;
/// # Ok::<(), librarian::Error>(())
/// ```
#[derive(Default)]
pub struct LibrarianBuilder {
    backend: Option<Arc<dyn MidiBackend>>,
    #[cfg(feature = "midi-io")]
    client_name: Option<String>,
    template: Option<DeviceTemplate>,
    channel: Option<u8>,
    queue_capacity: Option<usize>,
    mappings: Option<MappingTable>,
    auto_recall: bool,
}

impl LibrarianBuilder {
    pub fn backend(mut self, backend: Arc<dyn MidiBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Hardware ports through midir.
    #[cfg(feature = "midi-io")]
    pub fn io(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = Some(client_name.into());
        self
    }

    pub fn template(mut self, template: DeviceTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Mappings restored from persistence.
    pub fn mappings(mut self, table: MappingTable) -> Self {
        self.mappings = Some(table);
        self
    }

    /// Send the Program Change for every recall requested by a mapping,
    /// during [`Librarian::poll`].
    pub fn auto_recall(mut self, enabled: bool) -> Self {
        self.auto_recall = enabled;
        self
    }

    pub fn build(self) -> Result<Librarian> {
        let mut device = DeviceManager::builder();
        if let Some(backend) = self.backend {
            device = device.backend(backend);
        }
        #[cfg(feature = "midi-io")]
        if let Some(client_name) = self.client_name {
            device = device.io(client_name);
        }
        if let Some(template) = self.template {
            device = device.template(template);
        }
        if let Some(channel) = self.channel {
            device = device.channel(channel);
        }
        if let Some(capacity) = self.queue_capacity {
            device = device.queue_capacity(capacity);
        }

        let learn = match self.mappings {
            Some(table) => LearnEngine::with_mappings(table),
            None => LearnEngine::new(),
        };

        Ok(Librarian::new(device.build()?, learn, self.auto_recall))
    }
}
