//! Device manager: the command API, port selection and the real-time drain.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use librarian_midi_io::{DeviceManager, VirtualBackend};
//!
//! let backend = VirtualBackend::new();
//! backend.add_output_port("Synth");
//!
//! let device = DeviceManager::builder()
//!     .backend(Arc::new(backend.clone()))
//!     .build()?;
//! device.set_output_port("Synth")?;
//! device.set_channel(2)?;
//! device.send_program_change(10)?;
//!
//! // Once per audio block, on the real-time thread:
//! let mut events = Vec::new();
//! device.drain_into(&mut |bytes: &[u8], _offset: usize| events.push(bytes.to_vec()));
//! assert_eq!(events, vec![vec![0xC1, 10]]);
//! # Ok::<(), librarian_midi_io::Error>(())
//! ```

mod builder;

pub use builder::{DeviceManagerBuilder, DEFAULT_INCOMING_CAPACITY};

use crate::error::{Error, Result};
use crate::notify::{Broadcaster, Subscription, SubscriptionId};
use crate::port::{InputCallback, PortRegistry, RefreshReport};
use crate::queue::{CommandQueue, EventSink, QueuedCommand};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use librarian_midi::{codec, DeviceTemplate, EncodedMessage, MidiChannel};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type HookId = u64;

type IncomingHook = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Changes to port selection and channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    OutputPortChanged(Option<String>),
    InputPortChanged(Option<String>),
    OutputDisconnected(String),
    InputDisconnected(String),
    ChannelChanged(MidiChannel),
}

/// Everything behind the device lock.
struct DeviceState {
    registry: PortRegistry,
    channel: MidiChannel,
    template: DeviceTemplate,
}

/// MIDI output to one device, plus one input for learn and recall.
///
/// Clone is cheap (Arc internally). Every method except
/// [`drain_into`](Self::drain_into) belongs to the control thread.
#[derive(Clone)]
pub struct DeviceManager {
    inner: Arc<DeviceManagerInner>,
}

pub(crate) struct DeviceManagerInner {
    device: Mutex<DeviceState>,
    queue: Arc<CommandQueue>,
    /// Mirrors `registry.is_output_open()` for the real-time thread.
    output_open: Arc<AtomicBool>,
    incoming_tx: Sender<Vec<u8>>,
    incoming_rx: Receiver<Vec<u8>>,
    hooks: Mutex<Vec<(HookId, IncomingHook)>>,
    next_hook_id: AtomicU64,
    events: Broadcaster<DeviceEvent>,
}

impl DeviceManager {
    pub fn builder() -> DeviceManagerBuilder {
        DeviceManagerBuilder::default()
    }

    pub(crate) fn from_parts(
        registry: PortRegistry,
        channel: MidiChannel,
        template: DeviceTemplate,
        queue: CommandQueue,
        incoming_capacity: usize,
    ) -> Self {
        let (incoming_tx, incoming_rx) = crossbeam_channel::bounded(incoming_capacity);
        Self {
            inner: Arc::new(DeviceManagerInner {
                device: Mutex::new(DeviceState {
                    registry,
                    channel,
                    template,
                }),
                queue: Arc::new(queue),
                output_open: Arc::new(AtomicBool::new(false)),
                incoming_tx,
                incoming_rx,
                hooks: Mutex::new(Vec::new()),
                next_hook_id: AtomicU64::new(1),
                events: Broadcaster::new(),
            }),
        }
    }

    // ==================== Ports ====================

    /// Select the output port by name. An empty name closes it.
    ///
    /// Commands still queued when the output closes are discarded.
    pub fn set_output_port(&self, name: &str) -> Result<()> {
        let (result, before, after) = {
            let mut device = self.inner.device.lock();
            let before = device.registry.current_output_name().map(str::to_string);
            let result = device.registry.open_output(name);
            self.sync_output_open(&device.registry);
            let after = device.registry.current_output_name().map(str::to_string);
            (result, before, after)
        };

        if before != after {
            self.inner.events.emit(DeviceEvent::OutputPortChanged(after));
        }
        result
    }

    /// Select the input port by name. An empty name closes it.
    ///
    /// Received messages are queued for [`pump_incoming`](Self::pump_incoming).
    pub fn set_input_port(&self, name: &str) -> Result<()> {
        let callback = self.incoming_callback();
        let (result, before, after) = {
            let mut device = self.inner.device.lock();
            let before = device.registry.current_input_name().map(str::to_string);
            let result = device.registry.open_input(name, callback);
            let after = device.registry.current_input_name().map(str::to_string);
            (result, before, after)
        };

        if before != after {
            self.inner.events.emit(DeviceEvent::InputPortChanged(after));
        }
        result
    }

    pub fn get_available_output_ports(&self) -> Vec<String> {
        self.inner.device.lock().registry.available_output_ports()
    }

    pub fn get_available_input_ports(&self) -> Vec<String> {
        self.inner.device.lock().registry.available_input_ports()
    }

    pub fn current_output_port(&self) -> Option<String> {
        self.inner
            .device
            .lock()
            .registry
            .current_output_name()
            .map(str::to_string)
    }

    pub fn current_input_port(&self) -> Option<String> {
        self.inner
            .device
            .lock()
            .registry
            .current_input_name()
            .map(str::to_string)
    }

    pub fn is_output_open(&self) -> bool {
        self.inner.output_open.load(Ordering::Acquire)
    }

    pub fn is_input_open(&self) -> bool {
        self.inner.device.lock().registry.is_input_open()
    }

    /// Close ports whose devices have vanished. Call periodically.
    ///
    /// Ports are never reopened here.
    pub fn refresh(&self) -> RefreshReport {
        let report = {
            let mut device = self.inner.device.lock();
            let report = device.registry.refresh();
            self.sync_output_open(&device.registry);
            report
        };

        if let Some(name) = &report.output_disconnected {
            self.inner
                .events
                .emit(DeviceEvent::OutputDisconnected(name.clone()));
        }
        if let Some(name) = &report.input_disconnected {
            self.inner
                .events
                .emit(DeviceEvent::InputDisconnected(name.clone()));
        }
        report
    }

    fn sync_output_open(&self, registry: &PortRegistry) {
        let open = registry.is_output_open();
        self.inner.output_open.store(open, Ordering::Release);
        if !open {
            self.inner.queue.discard_all();
        }
    }

    // ==================== Channel & Template ====================

    /// Set the output channel (1-16).
    pub fn set_channel(&self, channel: u8) -> Result<()> {
        let channel = MidiChannel::from_display(channel)?;
        let changed = {
            let mut device = self.inner.device.lock();
            let changed = device.channel != channel;
            device.channel = channel;
            changed
        };
        if changed {
            self.inner.events.emit(DeviceEvent::ChannelChanged(channel));
        }
        Ok(())
    }

    /// Output channel as shown to users (1-16).
    pub fn get_channel(&self) -> u8 {
        self.channel().display()
    }

    pub fn channel(&self) -> MidiChannel {
        self.inner.device.lock().channel
    }

    pub fn set_template(&self, template: DeviceTemplate) {
        debug!("Device template set: {}", template.device_name);
        self.inner.device.lock().template = template;
    }

    pub fn template(&self) -> DeviceTemplate {
        self.inner.device.lock().template.clone()
    }

    // ==================== Sending ====================

    pub fn send_program_change(&self, program: u8) -> Result<()> {
        self.send_encoded(|channel| codec::encode_program_change(channel.display(), program))
    }

    pub fn send_control_change(&self, controller: u8, value: u8) -> Result<()> {
        self.send_encoded(|channel| {
            codec::encode_control_change(channel.display(), controller, value)
        })
    }

    /// One Bank Select controller: CC#0 when `use_msb`, CC#32 otherwise.
    pub fn send_bank_select(&self, bank: u8, use_msb: bool) -> Result<()> {
        self.send_encoded(|channel| codec::encode_bank_select(channel.display(), bank, use_msb))
    }

    /// Bare payloads are framed with F0/F7.
    pub fn send_sys_ex(&self, data: &[u8]) -> Result<()> {
        self.send_encoded(|_| codec::encode_sysex(data))
    }

    /// Recall `program`, preceded by Bank Select when the template uses it.
    ///
    /// CC#0 (MSB) and CC#32 (LSB), as the template asks, then the Program
    /// Change are queued as one group: all of them or none.
    pub fn send_patch_recall(&self, program: u8, bank: Option<u8>) -> Result<()> {
        let (channel, open, template) = {
            let device = self.inner.device.lock();
            (
                device.channel,
                device.registry.is_output_open(),
                device.template.clone(),
            )
        };

        if !template.is_valid_patch_number(program) {
            return Err(Error::InvalidRange(format!(
                "Patch {} is outside {}'s range {}-{}",
                program,
                template.device_name,
                template.min_patch_number(),
                template.max_patch_number()
            )));
        }

        let display = channel.display();
        let mut messages: Vec<EncodedMessage> = Vec::with_capacity(3);
        if let (true, Some(bank)) = (template.uses_bank_select(), bank) {
            if template.uses_msb() {
                messages.push(codec::encode_bank_select(display, bank, true)?);
            }
            if template.uses_lsb() {
                messages.push(codec::encode_bank_select(display, bank, false)?);
            }
        }
        messages.push(codec::encode_program_change(display, program)?);

        let commands = messages
            .iter()
            .map(QueuedCommand::try_from)
            .collect::<Result<Vec<_>>>()?;

        if !open {
            return Err(no_output());
        }
        self.inner.queue.enqueue_all(&commands).map_err(|e| {
            warn!(
                "MIDI output queue full, dropping patch recall ({} messages)",
                commands.len()
            );
            e
        })
    }

    fn send_encoded<F>(&self, encode: F) -> Result<()>
    where
        F: FnOnce(MidiChannel) -> librarian_midi::Result<EncodedMessage>,
    {
        let (channel, open) = {
            let device = self.inner.device.lock();
            (device.channel, device.registry.is_output_open())
        };

        let message = encode(channel)?;
        let command = QueuedCommand::try_from(&message)?;
        if !open {
            return Err(no_output());
        }
        self.inner.queue.enqueue(command).map_err(|e| {
            warn!("MIDI output queue full, dropping {:02X?}", message.as_bytes());
            e
        })
    }

    /// Number of commands waiting for the next drain.
    pub fn pending_commands(&self) -> usize {
        self.inner.queue.len()
    }

    // ==================== Real-Time ====================

    /// Deliver every queued command to `sink` at offset 0, oldest first.
    ///
    /// Real-time safe: no allocation, no blocking, no errors. With the
    /// output closed, pending commands are discarded instead.
    #[inline]
    pub fn drain_into<S: EventSink + ?Sized>(&self, sink: &mut S) -> usize {
        drain(&self.inner.queue, &self.inner.output_open, sink)
    }

    /// A handle for the audio callback that does not keep the ports alive.
    pub fn drain_handle(&self) -> DrainHandle {
        DrainHandle {
            queue: Arc::clone(&self.inner.queue),
            output_open: Arc::clone(&self.inner.output_open),
        }
    }

    /// Without a host: write queued commands straight to the output port.
    ///
    /// Returns how many were written. A failed write stops the flush; that
    /// command and everything after it stay queued. Control thread only.
    pub fn flush_to_port(&self) -> Result<usize> {
        let queue = &self.inner.queue;
        let mut device = self.inner.device.lock();
        if !device.registry.is_output_open() {
            let dropped = queue.discard_all();
            if dropped > 0 {
                debug!("Discarding {} queued MIDI commands, no output", dropped);
            }
            return Ok(0);
        }

        let pending = queue.len();
        let mut written = 0;
        while written < pending {
            let Some(command) = queue.peek() else {
                break;
            };
            if let Err(e) = device.registry.write_output(command.as_bytes()) {
                warn!(
                    "MIDI write failed after {} of {} commands, {} left queued: {}",
                    written,
                    pending,
                    queue.len(),
                    e
                );
                return Err(e);
            }
            queue.pop();
            written += 1;
        }
        Ok(written)
    }

    // ==================== Incoming ====================

    /// Register a hook for received messages, run by
    /// [`pump_incoming`](Self::pump_incoming) on the control thread.
    ///
    /// Hooks must not add or remove hooks.
    pub fn add_incoming_hook<F>(&self, hook: F) -> HookId
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        let id = self.inner.next_hook_id.fetch_add(1, Ordering::Relaxed);
        self.inner.hooks.lock().push((id, Box::new(hook)));
        id
    }

    pub fn remove_incoming_hook(&self, id: HookId) -> bool {
        let mut hooks = self.inner.hooks.lock();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    /// Run every hook on every message received since the last call, in
    /// arrival order. Returns the number of messages.
    pub fn pump_incoming(&self) -> usize {
        let mut delivered = 0;
        while let Ok(bytes) = self.inner.incoming_rx.try_recv() {
            let mut hooks = self.inner.hooks.lock();
            for (_, hook) in hooks.iter_mut() {
                hook(bytes.as_slice());
            }
            delivered += 1;
        }
        delivered
    }

    fn incoming_callback(&self) -> InputCallback {
        let tx = self.inner.incoming_tx.clone();
        Box::new(move |bytes: &[u8]| match tx.try_send(bytes.to_vec()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!("Incoming MIDI queue full, dropping {:02X?}", bytes);
            }
            Err(TrySendError::Disconnected(_)) => {}
        })
    }

    // ==================== Notifications ====================

    pub fn subscribe(&self) -> Subscription<DeviceEvent> {
        self.inner.events.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }
}

impl std::fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let device = self.inner.device.lock();
        f.debug_struct("DeviceManager")
            .field("registry", &device.registry)
            .field("channel", &device.channel)
            .field("queue", &self.inner.queue)
            .finish()
    }
}

impl Drop for DeviceManagerInner {
    fn drop(&mut self) {
        let device = self.device.get_mut();
        if device.registry.is_output_open() || device.registry.is_input_open() {
            info!("Closing MIDI ports");
        }
        device.registry.close_output();
        device.registry.close_input();
    }
}

/// Real-time end of the command queue.
///
/// Move a clone into the audio callback and call
/// [`drain_into`](Self::drain_into) once per block.
#[derive(Clone)]
pub struct DrainHandle {
    queue: Arc<CommandQueue>,
    output_open: Arc<AtomicBool>,
}

impl DrainHandle {
    #[inline]
    pub fn drain_into<S: EventSink + ?Sized>(&self, sink: &mut S) -> usize {
        drain(&self.queue, &self.output_open, sink)
    }
}

impl std::fmt::Debug for DrainHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainHandle")
            .field("output_open", &self.output_open.load(Ordering::Relaxed))
            .finish()
    }
}

#[inline]
fn drain<S: EventSink + ?Sized>(
    queue: &CommandQueue,
    output_open: &AtomicBool,
    sink: &mut S,
) -> usize {
    if output_open.load(Ordering::Acquire) {
        queue.drain_into(sink)
    } else {
        // A send that raced with the output closing can land after the
        // close discarded the queue.
        queue.try_discard_all();
        0
    }
}

fn no_output() -> Error {
    Error::OpenFailed("no MIDI output port is open".to_string())
}
