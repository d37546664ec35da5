//! # cncbridge-communication
//!
//! The Grbl serial transport, line parser, command queue, and per-port
//! session coordinator (C1–C4). Everything client-facing — the event
//! protocol, the client registry, error types — lives in
//! `cncbridge-core`; this crate only knows how to talk to a Grbl
//! controller over a serial line.

pub mod grbl;
pub mod transport;

pub use grbl::{classify, decode_alarm, decode_error, CommandQueue, GrblSession, RunState};
pub use transport::{list_ports, OpenParams, SerialLineTransport, SerialPortInfo, TransportEvent};
