use librarian_midi_io::DeviceManager;

fn main() {
    tracing_subscriber::fmt::init();

    let device = match DeviceManager::builder().io("librarian-list-ports").build() {
        Ok(device) => device,
        Err(e) => {
            eprintln!("Cannot start MIDI: {}", e);
            std::process::exit(1);
        }
    };

    println!("=== MIDI Input Ports ===");
    let inputs = device.get_available_input_ports();
    if inputs.is_empty() {
        println!("  (none found)");
    }
    for (i, name) in inputs.iter().enumerate() {
        println!("  [{}] {}", i, name);
    }

    println!("\n=== MIDI Output Ports ===");
    let outputs = device.get_available_output_ports();
    if outputs.is_empty() {
        println!("  (none found)");
    }
    for (i, name) in outputs.iter().enumerate() {
        println!("  [{}] {}", i, name);
    }
}
