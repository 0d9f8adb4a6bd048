//! A librarian session: one device, its learn engine, and the glue between
//! received messages and patch recall.

use crate::{LibrarianBuilder, Result};
use librarian_midi_io::{
    DeviceManager, DrainHandle, Error as DeviceError, HookId, LearnEngine, LearnOutcome,
    PatchSlot, RefreshReport,
};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::{debug, warn};

/// What one [`Librarian::poll`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Received messages handed to the learn engine.
    pub messages: usize,
    /// Slots whose mappings fired, in arrival order.
    pub recalls: Vec<PatchSlot>,
    pub refresh: RefreshReport,
}

/// Control-thread owner of a [`DeviceManager`] and a [`LearnEngine`].
///
/// Received messages reach the learn engine only from [`poll`](Self::poll),
/// which the application calls from its timer.
pub struct Librarian {
    device: DeviceManager,
    learn: Arc<Mutex<LearnEngine>>,
    recalls: Arc<Mutex<Vec<PatchSlot>>>,
    hook: HookId,
    auto_recall: bool,
}

impl Librarian {
    pub fn builder() -> LibrarianBuilder {
        LibrarianBuilder::default()
    }

    pub(crate) fn new(device: DeviceManager, learn: LearnEngine, auto_recall: bool) -> Self {
        let learn = Arc::new(Mutex::new(learn));
        let recalls = Arc::new(Mutex::new(Vec::new()));

        let hook_learn = Arc::clone(&learn);
        let hook_recalls = Arc::clone(&recalls);
        let hook = device.add_incoming_hook(move |bytes: &[u8]| {
            if let LearnOutcome::RecallRequested(slot) = hook_learn.lock().process_raw(bytes) {
                hook_recalls.lock().push(slot);
            }
        });

        Self {
            device,
            learn,
            recalls,
            hook,
            auto_recall,
        }
    }

    pub fn device(&self) -> &DeviceManager {
        &self.device
    }

    /// Lock the learn engine. Do not hold the guard across [`poll`](Self::poll).
    pub fn learn(&self) -> MutexGuard<'_, LearnEngine> {
        self.learn.lock()
    }

    /// For the audio callback.
    pub fn drain_handle(&self) -> DrainHandle {
        self.device.drain_handle()
    }

    /// Check ports, then run received messages through the learn engine.
    pub fn poll(&self) -> PollReport {
        let refresh = self.device.refresh();
        let messages = self.device.pump_incoming();
        let recalls = std::mem::take(&mut *self.recalls.lock());

        if self.auto_recall {
            for &slot in &recalls {
                if let Err(e) = self.recall(slot, None) {
                    warn!("Recall of patch slot {} failed: {}", slot, e);
                }
            }
        }
        if messages > 0 {
            debug!("Processed {} incoming MIDI messages", messages);
        }

        PollReport {
            messages,
            recalls,
            refresh,
        }
    }

    /// Recall `slot` as the Program Change of the same number.
    pub fn recall(&self, slot: PatchSlot, bank: Option<u8>) -> Result<()> {
        let program = u8::try_from(slot)
            .ok()
            .filter(|program| *program <= 127)
            .ok_or_else(|| {
                DeviceError::InvalidRange(format!("Patch slot {} has no program number", slot))
            })?;
        self.device.send_patch_recall(program, bank)?;
        Ok(())
    }
}

impl Drop for Librarian {
    fn drop(&mut self) {
        self.device.remove_incoming_hook(self.hook);
    }
}

impl std::fmt::Debug for Librarian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Librarian")
            .field("device", &self.device)
            .field("auto_recall", &self.auto_recall)
            .finish()
    }
}
