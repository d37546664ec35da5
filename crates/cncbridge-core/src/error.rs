//! Error handling for cncbridge
//!
//! The taxonomy follows the layers of the bridge itself: transport-level
//! failures (`TransportError`), command-queue/session misuse
//! (`SessionError`), and g-code ingestion (`IngestError`), composed into a
//! single `Error` via `thiserror`'s `#[from]`.

use thiserror::Error;

/// Errors raised by the line transport (C1).
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The serial device could not be opened.
    #[error("failed to open {port}: {reason}")]
    OpenError {
        /// Device name that failed to open.
        port: String,
        /// Underlying reason reported by the OS/driver.
        reason: String,
    },

    /// The transport closed unexpectedly (device removed, read error).
    #[error("transport for {port} closed unexpectedly")]
    TransportClosed {
        /// Device name whose transport closed.
        port: String,
    },

    /// A write was attempted while the transport is not open.
    #[error("write to {port} failed: {reason}")]
    WriteError {
        /// Device name the write targeted.
        port: String,
        /// Underlying reason for the write failure.
        reason: String,
    },
}

/// Errors raised by session/queue operations that target a port with no
/// live Session (C4/C7).
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// An operation was requested on a port with no open transport.
    #[error("{port} is not open")]
    NotOpen {
        /// The port the operation targeted.
        port: String,
    },

    /// An ingest or router operation named a port with no Session at all.
    #[error("no such port: {port}")]
    NoSuchPort {
        /// The unrecognized port name.
        port: String,
    },
}

/// Errors raised while ingesting an uploaded g-code program (C6).
#[derive(Error, Debug, Clone)]
pub enum IngestError {
    /// The uploaded text could not be turned into g-code lines.
    #[error("failed to parse g-code upload: {reason}")]
    ParseError {
        /// Description of what went wrong.
        reason: String,
    },
}

/// Unified error type for the cncbridge core.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Line transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Session/queue misuse.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// G-code ingestion failure.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Generic error not covered by the above.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a generic [`Error::Other`] from any displayable message.
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// True if the transport is simply not open for the targeted port —
    /// the router drops these silently per the command table (§4.7).
    pub fn is_not_open(&self) -> bool {
        matches!(self, Error::Session(SessionError::NotOpen { .. }))
    }
}

/// Result type using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
