//! # cncbridge
//!
//! A bridge and control plane between multiple remote clients and one or
//! more CNC controllers speaking the Grbl serial protocol. For each
//! attached serial port it maintains an open link to the controller,
//! streams G-code line-by-line respecting Grbl's one-outstanding-command
//! flow control, polls controller status, and fans out events to every
//! client attached to that port.
//!
//! ## Architecture
//!
//! - **cncbridge-core** — data model, error types, the client event
//!   protocol, and the client/port registries.
//! - **cncbridge-communication** — the Grbl serial transport, line
//!   parser, command queue, and per-port session.
//! - **cncbridge** (this crate) — configuration, g-code ingestion, and
//!   the command router wiring client events onto the session/queue.
//!
//! The socket layer that actually carries client events, and the CLI/HTTP
//! surface that drives this crate, are both out of scope — see
//! `SPEC_FULL.md`.

pub mod config;
pub mod ingest;
pub mod router;

pub use cncbridge_communication::GrblSession;
pub use cncbridge_core::{ClientId, Error, PortRegistry, Result, ServerEvent};
pub use config::Config;
pub use router::CommandRouter;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date, set at compile time by `build.rs`.
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize structured logging: console output, `RUST_LOG` support.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    Ok(())
}
