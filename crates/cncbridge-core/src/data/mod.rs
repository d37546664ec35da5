//! Data model shared between the communication crate and the wire-facing
//! event types.
//!
//! Grbl status reports carry axis coordinates as decimal strings (see
//! `spec.md` §4.2: "all as decimal strings, not re-parsed"); this module
//! intentionally keeps them as `String`, not `f64` — re-parsing is a job
//! for the client, not the bridge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grbl's reported machine state, as carried in a status report's first
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrblState {
    Idle,
    Run,
    Hold,
    Door,
    Home,
    Alarm,
    Check,
    /// Any state token not in the set above; preserved verbatim so an
    /// unrecognized firmware variant is not silently dropped.
    Other(String),
}

impl GrblState {
    /// Parse the leading state token of a status report (e.g. `"Idle"`).
    pub fn parse(token: &str) -> Self {
        match token {
            "Idle" => Self::Idle,
            "Run" => Self::Run,
            "Hold" => Self::Hold,
            "Door" => Self::Door,
            "Home" => Self::Home,
            "Alarm" => Self::Alarm,
            "Check" => Self::Check,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for GrblState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Run => write!(f, "Run"),
            Self::Hold => write!(f, "Hold"),
            Self::Door => write!(f, "Door"),
            Self::Home => write!(f, "Home"),
            Self::Alarm => write!(f, "Alarm"),
            Self::Check => write!(f, "Check"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Three axis values carried verbatim as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisTriple {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl AxisTriple {
    pub fn new(x: impl Into<String>, y: impl Into<String>, z: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }
}

/// A fully classified Grbl status report (`<STATE,MPos:x,y,z,WPos:x,y,z>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: GrblState,
    pub machine_pos: AxisTriple,
    pub work_pos: AxisTriple,
}

/// A line classified by the Grbl parser (C2).
///
/// `ParserState`'s tokens are the whitespace-split, emptiness-filtered
/// contents of a `[...]` line; `AckError`'s payload is the raw remainder
/// following `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrblLine {
    Boot,
    Status(StatusReport),
    ParserState(Vec<String>),
    AckOk,
    AckError(String),
    Other(String),
}
