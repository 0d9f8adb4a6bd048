//! Typed change notifications.
//!
//! Subscribers register explicitly and receive events over their own
//! channel. There is no global registry.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub type SubscriptionId = u64;

/// Receiving end of a subscription. Dropping it unsubscribes lazily.
#[derive(Debug)]
pub struct Subscription<E> {
    pub id: SubscriptionId,
    pub receiver: Receiver<E>,
}

impl<E> Subscription<E> {
    /// Non-blocking drain of everything received so far.
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }
}

pub struct Broadcaster<E> {
    subscribers: Mutex<Vec<(SubscriptionId, Sender<E>)>>,
    next_id: AtomicU64,
}

impl<E: Clone> Broadcaster<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> Subscription<E> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = unbounded();
        self.subscribers.lock().push((id, sender));
        Subscription { id, receiver }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    /// Delivers to every live subscriber; dropped receivers are pruned.
    pub fn emit(&self, event: E) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<E: Clone> Default for Broadcaster<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Broadcaster<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
