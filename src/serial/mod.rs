//! Serial command sender for the Arduino servo sketch.
//!
//! The sketch reads newline-terminated text commands. [`protocol`] defines the command grammar
//! and the CLI/serve-mode parsing, [`link`] drives the actual port.

/// Command grammar understood by the servo sketch
pub mod protocol;

/// Serial port handling
pub mod link;

pub use link::{default_port, CommandPort, SerialLink};
pub use protocol::{demo_sequence, parse_serve_line, plan_commands, SerialCommand, Step};
