//! Grbl-specific protocol handling: error code decoding, line
//! classification (C2), the command queue (C3), and the per-port session
//! (C4).

pub mod error_decoder;
pub mod parser;
pub mod queue;
pub mod session;

pub use error_decoder::{decode_alarm, decode_error, format_alarm, format_error};
pub use parser::classify;
pub use queue::{CommandQueue, RunState};
pub use session::GrblSession;
