//! Test helpers and fixtures for librarian integration tests.
//!
//! Every fixture runs against in-process ports, so no MIDI hardware or
//! system MIDI library is needed.

use librarian::prelude::*;
use std::sync::Arc;

pub const SYNTH_PORT: &str = "JV-1080";
pub const CONTROLLER_PORT: &str = "Pad Controller";

/// Frames per simulated audio block.
pub const TEST_BLOCK_SIZE: usize = 512;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// One synth output and one controller input, both open.
pub fn test_librarian(template: DeviceTemplate) -> (Librarian, VirtualBackend) {
    init_tracing();
    let backend = VirtualBackend::new();
    backend.add_output_port(SYNTH_PORT);
    backend.add_input_port(CONTROLLER_PORT);

    let librarian = Librarian::builder()
        .backend(Arc::new(backend.clone()))
        .template(template)
        .build()
        .expect("Failed to build test librarian");
    librarian
        .device()
        .set_output_port(SYNTH_PORT)
        .expect("Failed to open synth port");
    librarian
        .device()
        .set_input_port(CONTROLLER_PORT)
        .expect("Failed to open controller port");
    (librarian, backend)
}

/// Run one block through `handle` and return its events with their offsets.
pub fn process_block(handle: &DrainHandle) -> Vec<(usize, Vec<u8>)> {
    let mut events = Vec::new();
    handle.drain_into(&mut |bytes: &[u8], sample_offset: usize| {
        assert!(sample_offset < TEST_BLOCK_SIZE);
        events.push((sample_offset, bytes.to_vec()));
    });
    events
}
