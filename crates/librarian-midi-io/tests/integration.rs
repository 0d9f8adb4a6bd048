//! Integration tests for librarian-midi-io.
//!
//! Multi-component workflows against in-process ports; no hardware needed.

use librarian_midi_io::{
    DeviceEvent, DeviceManager, Error, LearnEngine, LearnEvent, LearnOutcome, Mapping,
    MappingTable, MessageType, MidiChannel, VirtualBackend,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn setup() -> (DeviceManager, VirtualBackend) {
    init_tracing();
    let backend = VirtualBackend::new();
    backend.add_output_port("JV-1080");
    backend.add_output_port("DX7");
    backend.add_input_port("Pad Controller");
    let device = DeviceManager::builder()
        .backend(Arc::new(backend.clone()))
        .build()
        .unwrap();
    (device, backend)
}

fn drain(device: &DeviceManager) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    device.drain_into(&mut |bytes: &[u8], offset: usize| {
        assert_eq!(offset, 0);
        out.push(bytes.to_vec());
    });
    out
}

// ---------------------------------------------------------------------------
// 1. Command path: send -> queue -> real-time drain
// ---------------------------------------------------------------------------

#[test]
fn test_program_change_on_every_channel() {
    let (device, _) = setup();
    device.set_output_port("JV-1080").unwrap();

    for channel in 1..=16u8 {
        device.set_channel(channel).unwrap();
        device.send_program_change(channel * 7).unwrap();
    }

    let drained = drain(&device);
    assert_eq!(drained.len(), 16);
    for (i, message) in drained.iter().enumerate() {
        let channel = i as u8 + 1;
        assert_eq!(message, &vec![0xC0 | (channel - 1), channel * 7]);
    }
}

#[test]
fn test_bank_select_msb_and_lsb() {
    let (device, _) = setup();
    device.set_output_port("JV-1080").unwrap();

    device.send_bank_select(64, true).unwrap();
    device.send_bank_select(64, false).unwrap();
    assert_eq!(drain(&device), vec![vec![0xB0, 0, 64], vec![0xB0, 32, 64]]);
}

#[test]
fn test_queue_overflow_is_immediate() {
    let (device, _) = setup();
    device.set_output_port("JV-1080").unwrap();

    for i in 0..512u32 {
        device.send_control_change(7, (i % 128) as u8).unwrap();
    }
    assert_eq!(device.send_program_change(1), Err(Error::QueueFull));
    assert_eq!(device.pending_commands(), 512);

    assert_eq!(drain(&device).len(), 512);
    device.send_program_change(1).unwrap();
}

#[test]
fn test_fifo_across_threads() {
    let (device, _) = setup();
    device.set_output_port("JV-1080").unwrap();
    let handle = device.drain_handle();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let audio = thread::spawn(move || {
        let mut cycles = 0;
        while sink.lock().len() < 300 && cycles < 1_000_000 {
            handle.drain_into(&mut |bytes: &[u8], _: usize| sink.lock().push(bytes[1]));
            cycles += 1;
            thread::yield_now();
        }
    });

    for i in 0..300u32 {
        let program = (i % 128) as u8;
        while let Err(Error::QueueFull) = device.send_program_change(program) {
            thread::yield_now();
        }
    }
    audio.join().unwrap();

    let received = received.lock();
    let expected: Vec<u8> = (0..300u32).map(|i| (i % 128) as u8).collect();
    assert_eq!(*received, expected);
}

// ---------------------------------------------------------------------------
// 2. Port lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_switching_output_port() {
    let (device, backend) = setup();
    assert_eq!(device.get_available_output_ports(), vec!["JV-1080", "DX7"]);

    device.set_output_port("JV-1080").unwrap();
    device.send_program_change(3).unwrap();
    device.flush_to_port().unwrap();

    device.set_output_port("DX7").unwrap();
    device.send_program_change(4).unwrap();
    device.flush_to_port().unwrap();

    assert_eq!(backend.sent_messages("JV-1080"), vec![vec![0xC0, 3]]);
    assert_eq!(backend.sent_messages("DX7"), vec![vec![0xC0, 4]]);
    assert_eq!(device.current_output_port().as_deref(), Some("DX7"));
}

#[test]
fn test_unknown_port_keeps_current_output() {
    let (device, _) = setup();
    device.set_output_port("JV-1080").unwrap();
    assert!(matches!(
        device.set_output_port("Nord Lead"),
        Err(Error::PortNotFound(_))
    ));
    assert!(device.is_output_open());
}

#[test]
fn test_disconnect_then_manual_reconnect() {
    let (device, backend) = setup();
    let events = device.subscribe();
    device.set_output_port("JV-1080").unwrap();
    device.send_program_change(1).unwrap();

    backend.remove_output_port("JV-1080");
    let report = device.refresh();
    assert_eq!(report.output_disconnected.as_deref(), Some("JV-1080"));
    assert!(!device.is_output_open());

    // Queued commands are gone and new sends fail fast.
    assert!(drain(&device).is_empty());
    assert!(matches!(
        device.send_program_change(2),
        Err(Error::OpenFailed(_))
    ));

    backend.add_output_port("JV-1080");
    let report = device.refresh();
    assert_eq!(report.output_available_again.as_deref(), Some("JV-1080"));
    assert!(!device.is_output_open());

    device.set_output_port("JV-1080").unwrap();
    device.send_program_change(2).unwrap();
    assert_eq!(drain(&device), vec![vec![0xC0, 2]]);

    assert_eq!(
        events.drain(),
        vec![
            DeviceEvent::OutputPortChanged(Some("JV-1080".to_string())),
            DeviceEvent::OutputDisconnected("JV-1080".to_string()),
            DeviceEvent::OutputPortChanged(Some("JV-1080".to_string())),
        ]
    );
}

#[test]
fn test_input_disconnect() {
    let (device, backend) = setup();
    device.set_input_port("Pad Controller").unwrap();
    assert!(backend.is_input_listening("Pad Controller"));

    backend.remove_input_port("Pad Controller");
    let report = device.refresh();
    assert_eq!(report.input_disconnected.as_deref(), Some("Pad Controller"));
    assert!(!device.is_input_open());
}

// ---------------------------------------------------------------------------
// 3. Learn: input -> pump -> learn engine -> recall
// ---------------------------------------------------------------------------

#[test]
fn test_learn_and_recall_through_input() {
    let (device, backend) = setup();
    device.set_output_port("JV-1080").unwrap();
    device.set_input_port("Pad Controller").unwrap();

    let engine = Arc::new(Mutex::new(LearnEngine::new()));
    let learn_events = engine.lock().subscribe();
    let hook_engine = Arc::clone(&engine);
    device.add_incoming_hook(move |bytes: &[u8]| {
        hook_engine.lock().process_raw(bytes);
    });

    engine.lock().start_learning(5);
    backend.inject("Pad Controller", &[0xC0, 10]);
    assert!(engine.lock().is_learning());
    assert_eq!(device.pump_incoming(), 1);
    assert!(!engine.lock().is_learning());

    backend.inject("Pad Controller", &[0xC0, 11]);
    backend.inject("Pad Controller", &[0xC0, 10]);
    device.pump_incoming();

    let recalls: Vec<u32> = learn_events
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            LearnEvent::PatchRecallRequested(slot) => Some(slot),
            _ => None,
        })
        .collect();
    assert_eq!(recalls, vec![5]);

    for slot in recalls {
        device.send_patch_recall(slot as u8, None).unwrap();
    }
    assert_eq!(drain(&device), vec![vec![0xC0, 5]]);
}

#[test]
fn test_relearn_with_control_change() {
    let mut engine = LearnEngine::new();
    engine.start_learning(5);
    engine.process_raw(&[0xC0, 10]);

    engine.start_learning(5);
    assert!(matches!(
        engine.process_raw(&[0xB1, 20, 127]),
        LearnOutcome::Learned(_)
    ));

    assert_eq!(engine.process_raw(&[0xC0, 10]), LearnOutcome::Ignored);
    assert_eq!(engine.process_raw(&[0xB1, 20, 0]), LearnOutcome::Ignored);
    assert_eq!(
        engine.process_raw(&[0xB1, 20, 127]),
        LearnOutcome::RecallRequested(5)
    );
}

// ---------------------------------------------------------------------------
// 4. Persistence contract
// ---------------------------------------------------------------------------

#[test]
fn test_mapping_table_reload_preserves_order() {
    let ch = |n| MidiChannel::from_display(n).unwrap();
    let mut engine = LearnEngine::new();
    engine.add_mapping(Mapping::new(9, MessageType::NoteOn, ch(10), 36, 100));
    engine.add_mapping(Mapping::new(2, MessageType::ProgramChange, ch(1), 2, 0));
    engine.add_mapping(Mapping::new(4, MessageType::ControlChange, ch(16), 80, 127));

    let json = serde_json::to_string(&engine.mapping_table()).unwrap();
    assert!(json.contains(r#""patchSlot":9"#));
    assert!(json.contains(r#""channel":16"#));

    let table: MappingTable = serde_json::from_str(&json).unwrap();
    let reloaded = LearnEngine::with_mappings(table);
    let slots: Vec<u32> = reloaded
        .get_all_mappings()
        .iter()
        .map(|m| m.patch_slot)
        .collect();
    assert_eq!(slots, vec![9, 2, 4]);
}
