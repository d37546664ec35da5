//! Grbl Parser (C2).
//!
//! A pure function from one trimmed line to a [`GrblLine`] classification,
//! per §4.2's table. The parser never re-parses numeric fields — status
//! report coordinates are kept as the decimal strings Grbl sent.

use cncbridge_core::{AxisTriple, GrblLine, GrblState, StatusReport};

/// Classify one already-trimmed line from the transport.
pub fn classify(line: &str) -> GrblLine {
    if line.to_ascii_lowercase().starts_with("grbl") {
        return GrblLine::Boot;
    }
    if line.starts_with('<') && line.ends_with('>') {
        if let Some(status) = parse_status(line) {
            return GrblLine::Status(status);
        }
    }
    if line.starts_with('[') && line.ends_with(']') {
        return GrblLine::ParserState(parse_tokens(line));
    }
    if line.starts_with("ok") {
        return GrblLine::AckOk;
    }
    if line.starts_with("error") {
        return GrblLine::AckError(line["error".len()..].trim_start_matches(':').to_string());
    }
    GrblLine::Other(line.to_string())
}

/// Parse `<STATE,MPos:X,Y,Z,WPos:X,Y,Z>` into a [`StatusReport`].
///
/// Returns `None` if the line has the right bracketing but not the exact
/// seven comma-separated fields the grammar requires; such a line falls
/// back to `Other` in [`classify`].
fn parse_status(line: &str) -> Option<StatusReport> {
    let inner = &line[1..line.len() - 1];
    let parts: Vec<&str> = inner.split(',').collect();
    if parts.len() != 7 {
        return None;
    }
    let state = GrblState::parse(parts[0]);
    let mx = parts[1].strip_prefix("MPos:")?;
    let my = parts[2];
    let mz = parts[3];
    let wx = parts[4].strip_prefix("WPos:")?;
    let wy = parts[5];
    let wz = parts[6];

    Some(StatusReport {
        state,
        machine_pos: AxisTriple::new(mx, my, mz),
        work_pos: AxisTriple::new(wx, wy, wz),
    })
}

/// Parse `[ TOKEN (SPACE TOKEN)* ]` into its whitespace-trimmed tokens,
/// with empties removed.
fn parse_tokens(line: &str) -> Vec<String> {
    let inner = &line[1..line.len() - 1];
    inner
        .split_whitespace()
        .map(|t| t.to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_boot_banner() {
        assert_eq!(classify("Grbl 0.9j ['$' for help]"), GrblLine::Boot);
        assert_eq!(classify("grbl 1.1h"), GrblLine::Boot);
    }

    #[test]
    fn classifies_status_report_with_string_fields() {
        let classified =
            classify("<Idle,MPos:5.529,0.560,7.000,WPos:1.529,-5.440,-0.000>");
        match classified {
            GrblLine::Status(report) => {
                assert_eq!(report.state, GrblState::Idle);
                assert_eq!(report.machine_pos, AxisTriple::new("5.529", "0.560", "7.000"));
                assert_eq!(report.work_pos, AxisTriple::new("1.529", "-5.440", "-0.000"));
            }
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[test]
    fn malformed_status_falls_back_to_other() {
        let classified = classify("<Idle,garbage>");
        assert_eq!(classified, GrblLine::Other("<Idle,garbage>".to_string()));
    }

    #[test]
    fn classifies_parser_state_tokens() {
        let classified =
            classify("[G0 G54 G17 G21 G90 G94 M0 M5 M9 T0 F2540. S0.]");
        assert_eq!(
            classified,
            GrblLine::ParserState(vec![
                "G0".into(), "G54".into(), "G17".into(), "G21".into(), "G90".into(),
                "G94".into(), "M0".into(), "M5".into(), "M9".into(), "T0".into(),
                "F2540.".into(), "S0.".into(),
            ])
        );
    }

    #[test]
    fn classifies_ack_ok_and_ack_error() {
        assert_eq!(classify("ok"), GrblLine::AckOk);
        assert_eq!(classify("error:9"), GrblLine::AckError("9".to_string()));
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(
            classify("ALARM:1"),
            GrblLine::Other("ALARM:1".to_string())
        );
    }
}
