//! MIDI vocabulary for the patch librarian.
//!
//! Pure building blocks shared by the I/O subsystem:
//!
//! - **Channels**: [`MidiChannel`] converts between the 1-16 display numbering
//!   and the 0-15 wire numbering. Nothing else re-derives that mapping.
//! - **Codec**: validated encoders for Program Change, Control Change,
//!   Bank Select and SysEx ([`codec`]).
//! - **Recognition**: [`IncomingMessage`] classifies received bytes into the
//!   message kinds the learn engine understands.
//! - **Device templates**: read-only per-synth configuration consulted when
//!   recalling patches.
//!
//! # Example
//!
//! ```
//! use librarian_midi::codec;
//!
//! let msg = codec::encode_program_change(1, 10).unwrap();
//! assert_eq!(msg.as_bytes(), &[0xC0, 10]);
//! ```

pub mod error;
pub use error::{Error, Result};

mod channel;
pub use channel::MidiChannel;

pub mod codec;
pub use codec::EncodedMessage;

mod message;
pub use message::IncomingMessage;

mod template;
pub use template::DeviceTemplate;
