//! Ingest Hook (C6).
//!
//! Accepts a `(port, gcode_text)` pair and loads it into that port's
//! command queue. The text-to-lines split is the only piece of "g-code
//! parsing" this crate does — comment stripping and semantic
//! interpretation are out of scope (§1).

use cncbridge_communication::GrblSession;
use cncbridge_core::{Error, PortRegistry, Result, SessionError};
use std::sync::Arc;

/// Split uploaded text into stripped, non-empty lines.
fn split_lines(gcode_text: &str) -> Vec<String> {
    gcode_text
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Look up the Session for `port` and replace its queued program.
///
/// Fails with `NoSuchPort` if no Session exists for `port` — this does
/// not require the transport to be open (§4.6 names no such precondition,
/// only that a Session exists).
pub fn ingest(registry: &PortRegistry<GrblSession>, port: &str, gcode_text: String) -> Result<()> {
    let session: Arc<GrblSession> = registry
        .get(port)
        .ok_or_else(|| Error::from(SessionError::NoSuchPort { port: port.to_string() }))?;
    let lines = split_lines(&gcode_text);
    session.load_program(gcode_text, lines);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_strips_blank_lines() {
        let lines = split_lines("G0 X10\n\n  G0 Y10  \n\n\nG1 Z0\n");
        assert_eq!(lines, vec!["G0 X10", "G0 Y10", "G1 Z0"]);
    }

    #[test]
    fn ingest_on_unknown_port_fails_with_no_such_port() {
        let registry: PortRegistry<GrblSession> = PortRegistry::new();
        let result = ingest(&registry, "/dev/ttyNOPE", "G0 X10".to_string());
        assert!(matches!(result, Err(Error::Session(SessionError::NoSuchPort { .. }))));
    }
}
