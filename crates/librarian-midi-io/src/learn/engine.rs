//! Learn-mode state machine and mapping lookup.

use super::mapping::{Mapping, MappingTable, PatchSlot};
use crate::notify::{Broadcaster, Subscription, SubscriptionId};
use librarian_midi::IncomingMessage;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LearnState {
    #[default]
    Idle,
    /// The next recognized message becomes the trigger for this slot.
    Learning(PatchSlot),
}

/// Result of feeding one message to [`LearnEngine::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    Learned(Mapping),
    RecallRequested(PatchSlot),
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnEvent {
    StateChanged(LearnState),
    /// Any change to the mapping table. Persistence listens for this.
    MappingsChanged,
    MappingLearned(Mapping),
    /// Patch recall listens for this.
    PatchRecallRequested(PatchSlot),
}

/// Mapping table plus learn state.
///
/// Control thread only. Received messages must be marshaled onto the
/// control thread before they reach [`process`](Self::process).
#[derive(Debug, Default)]
pub struct LearnEngine {
    /// At most one mapping per slot, in insertion order.
    mappings: Vec<Mapping>,
    state: LearnState,
    events: Broadcaster<LearnEvent>,
}

impl LearnEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mappings(table: MappingTable) -> Self {
        let mut engine = Self::new();
        engine.insert_all(table);
        engine
    }

    /// Always notifies, even when already learning `slot`.
    pub fn start_learning(&mut self, slot: PatchSlot) {
        self.set_state(LearnState::Learning(slot));
        debug!("MIDI learn started for patch slot {}", slot);
    }

    /// Always notifies, even when already idle.
    pub fn stop_learning(&mut self) {
        self.set_state(LearnState::Idle);
    }

    pub fn is_learning(&self) -> bool {
        matches!(self.state, LearnState::Learning(_))
    }

    pub fn learning_slot(&self) -> Option<PatchSlot> {
        match self.state {
            LearnState::Learning(slot) => Some(slot),
            LearnState::Idle => None,
        }
    }

    pub fn state(&self) -> LearnState {
        self.state
    }

    /// Install `mapping`, replacing any mapping already bound to its slot.
    pub fn add_mapping(&mut self, mapping: Mapping) {
        self.insert(mapping);
        self.events.emit(LearnEvent::MappingsChanged);
    }

    /// Returns whether a mapping was bound to `slot`. Listeners are
    /// notified either way.
    pub fn remove_mapping(&mut self, slot: PatchSlot) -> bool {
        let before = self.mappings.len();
        self.mappings.retain(|m| m.patch_slot != slot);
        self.events.emit(LearnEvent::MappingsChanged);
        self.mappings.len() != before
    }

    pub fn get_all_mappings(&self) -> Vec<Mapping> {
        self.mappings.clone()
    }

    pub fn get_mapping(&self, slot: PatchSlot) -> Option<&Mapping> {
        self.mappings.iter().find(|m| m.patch_slot == slot)
    }

    /// First mapping, in insertion order, triggered by `message`.
    pub fn find_mapping(&self, message: &IncomingMessage) -> Option<&Mapping> {
        self.mappings.iter().find(|m| m.matches(message))
    }

    /// Capture `message` while learning, otherwise look it up.
    pub fn process(&mut self, message: &IncomingMessage) -> LearnOutcome {
        match self.state {
            LearnState::Learning(slot) => {
                let Some(mapping) = Mapping::capture(slot, message) else {
                    return LearnOutcome::Ignored;
                };
                self.insert(mapping);
                info!(
                    "Learned {:?} on channel {} ({}, {}) for patch slot {}",
                    mapping.message_type, mapping.channel, mapping.data1, mapping.data2, slot
                );
                self.events.emit(LearnEvent::MappingLearned(mapping));
                self.events.emit(LearnEvent::MappingsChanged);
                self.set_state(LearnState::Idle);
                LearnOutcome::Learned(mapping)
            }
            LearnState::Idle => match self.find_mapping(message) {
                Some(mapping) => {
                    let slot = mapping.patch_slot;
                    self.events.emit(LearnEvent::PatchRecallRequested(slot));
                    LearnOutcome::RecallRequested(slot)
                }
                None => LearnOutcome::Ignored,
            },
        }
    }

    pub fn process_raw(&mut self, bytes: &[u8]) -> LearnOutcome {
        self.process(&IncomingMessage::parse(bytes))
    }

    pub fn mapping_table(&self) -> MappingTable {
        MappingTable(self.mappings.clone())
    }

    /// Replace the whole table. A slot listed twice keeps its last entry.
    pub fn load_mappings(&mut self, table: MappingTable) {
        self.mappings.clear();
        self.insert_all(table);
        self.events.emit(LearnEvent::MappingsChanged);
    }

    pub fn clear_mappings(&mut self) {
        if self.mappings.is_empty() {
            return;
        }
        self.mappings.clear();
        self.events.emit(LearnEvent::MappingsChanged);
    }

    pub fn subscribe(&self) -> Subscription<LearnEvent> {
        self.events.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn insert(&mut self, mapping: Mapping) {
        self.mappings.retain(|m| m.patch_slot != mapping.patch_slot);
        self.mappings.push(mapping);
    }

    fn insert_all(&mut self, table: MappingTable) {
        for mapping in table {
            self.insert(mapping);
        }
    }

    fn set_state(&mut self, state: LearnState) {
        self.state = state;
        self.events.emit(LearnEvent::StateChanged(state));
    }
}
