//! Bounded command FIFO between the control thread and the real-time thread.
//!
//! - Producer: `DeviceManager::send_*` on the control thread
//! - Consumer: the host's processing callback, once per block
//!
//! Both ends share one lock. The real-time side only ever `try_lock`s it and
//! does nothing but copy bytes while holding it.

use crate::error::{Error, Result};
use librarian_midi::EncodedMessage;
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};

pub const DEFAULT_QUEUE_CAPACITY: usize = 512;

/// Raw MIDI bytes stored inline, so neither end allocates.
#[derive(Clone, Copy)]
pub struct QueuedCommand {
    data: [u8; QueuedCommand::MAX_LEN],
    len: u16,
}

impl QueuedCommand {
    /// Longest message a slot can hold, SysEx framing included.
    pub const MAX_LEN: usize = 256;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > Self::MAX_LEN {
            return Err(Error::InvalidSysEx(format!(
                "message is {} bytes, queue slots hold at most {}",
                bytes.len(),
                Self::MAX_LEN
            )));
        }
        let mut data = [0u8; Self::MAX_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            data,
            len: bytes.len() as u16,
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl TryFrom<&EncodedMessage> for QueuedCommand {
    type Error = Error;

    fn try_from(message: &EncodedMessage) -> Result<Self> {
        Self::from_bytes(message.as_bytes())
    }
}

impl TryFrom<EncodedMessage> for QueuedCommand {
    type Error = Error;

    fn try_from(message: EncodedMessage) -> Result<Self> {
        Self::from_bytes(message.as_bytes())
    }
}

impl std::fmt::Debug for QueuedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("QueuedCommand")
            .field(&self.as_bytes())
            .finish()
    }
}

impl PartialEq for QueuedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for QueuedCommand {}

/// Receives drained commands on the real-time thread.
pub trait EventSink {
    /// `sample_offset` is relative to the start of the current block.
    fn add_event(&mut self, bytes: &[u8], sample_offset: usize);
}

impl<F> EventSink for F
where
    F: FnMut(&[u8], usize),
{
    #[inline]
    fn add_event(&mut self, bytes: &[u8], sample_offset: usize) {
        self(bytes, sample_offset)
    }
}

pub struct CommandQueue {
    ring: Mutex<(HeapProd<QueuedCommand>, HeapCons<QueuedCommand>)>,
    capacity: usize,
}

impl CommandQueue {
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for
    /// capacities that come from configuration.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "command queue capacity must be non-zero");
        let (producer, consumer) = HeapRb::<QueuedCommand>::new(capacity).split();
        Self {
            ring: Mutex::new((producer, consumer)),
            capacity,
        }
    }

    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self::new(capacity))
    }

    /// Append one command, or fail with `QueueFull` leaving the queue as it was.
    pub fn enqueue(&self, command: QueuedCommand) -> Result<()> {
        let mut ring = self.ring.lock();
        ring.0.try_push(command).map_err(|_| Error::QueueFull)
    }

    /// Append every command or none of them.
    pub fn enqueue_all(&self, commands: &[QueuedCommand]) -> Result<()> {
        let mut ring = self.ring.lock();
        let producer = &mut ring.0;
        if producer.vacant_len() < commands.len() {
            return Err(Error::QueueFull);
        }
        producer.push_slice(commands);
        Ok(())
    }

    /// Hand every ready command to `sink`, oldest first, at offset 0.
    ///
    /// Never blocks. If the producer holds the lock right now this cycle
    /// yields nothing and the commands wait for the next one.
    pub fn drain_into<S: EventSink + ?Sized>(&self, sink: &mut S) -> usize {
        let Some(mut ring) = self.ring.try_lock() else {
            return 0;
        };
        let consumer = &mut ring.1;

        // The ready region may wrap past the end of the buffer.
        let (head, tail) = consumer.as_slices();
        let count = head.len() + tail.len();
        for command in head.iter().chain(tail.iter()) {
            sink.add_event(command.as_bytes(), 0);
        }
        consumer.skip(count);
        count
    }

    /// Drop everything pending without delivering it. Never blocks.
    pub fn try_discard_all(&self) -> usize {
        match self.ring.try_lock() {
            Some(mut ring) => ring.1.clear(),
            None => 0,
        }
    }

    /// Drop everything pending. Control thread only.
    pub fn discard_all(&self) -> usize {
        self.ring.lock().1.clear()
    }

    /// Oldest pending command, left in place.
    pub fn peek(&self) -> Option<QueuedCommand> {
        let ring = self.ring.lock();
        let (head, tail) = ring.1.as_slices();
        head.first().or_else(|| tail.first()).copied()
    }

    /// Remove the oldest pending command.
    pub fn pop(&self) -> Option<QueuedCommand> {
        self.ring.lock().1.try_pop()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().1.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn vacant_len(&self) -> usize {
        self.ring.lock().0.vacant_len()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("capacity", &self.capacity)
            .finish()
    }
}
