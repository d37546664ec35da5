//! Server → client event protocol (§6).
//!
//! The transport that actually carries these to a socket is out of
//! scope; this module only defines the named-event/JSON-payload shape so
//! that whatever carries them (a websocket layer, a test harness) can
//! serialize `{"event": name, "data": payload}` without cncbridge-core
//! depending on a socket framework.

use crate::data::{GrblState, StatusReport};
use serde::Serialize;
use serde_json::{json, Value};

/// One OS or configured serial port, as reported by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct PortInfo {
    pub port: String,
    pub manufacturer: Option<String>,
    pub inuse: bool,
}

/// A fully-formed event bound for one or more clients.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    SerialPortList(Vec<PortInfo>),
    SerialPortOpen {
        port: String,
        baudrate: u32,
        inuse: bool,
    },
    SerialPortClose {
        port: String,
        inuse: bool,
    },
    SerialPortError {
        port: String,
    },
    /// A raw line echoed back to (or broadcast toward) a client.
    SerialPortData(String),
    GrblCurrentStatus(StatusReport),
    GrblGcodeModes(Vec<String>),
    GcodeQueueStatus {
        executed: usize,
        total: usize,
    },
}

impl ServerEvent {
    /// Wire event name, exactly as named in §6.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SerialPortList(_) => "serialport:list",
            Self::SerialPortOpen { .. } => "serialport:open",
            Self::SerialPortClose { .. } => "serialport:close",
            Self::SerialPortError { .. } => "serialport:error",
            Self::SerialPortData(_) => "serialport:data",
            Self::GrblCurrentStatus(_) => "grbl:current-status",
            Self::GrblGcodeModes(_) => "grbl:gcode-modes",
            Self::GcodeQueueStatus { .. } => "gcode:queue-status",
        }
    }

    /// The event payload, shaped per §6's server→client table.
    pub fn payload(&self) -> Value {
        match self {
            Self::SerialPortList(ports) => json!(ports),
            Self::SerialPortOpen {
                port,
                baudrate,
                inuse,
            } => json!({ "port": port, "baudrate": baudrate, "inuse": inuse }),
            Self::SerialPortClose { port, inuse } => json!({ "port": port, "inuse": inuse }),
            Self::SerialPortError { port } => json!({ "port": port }),
            Self::SerialPortData(line) => json!(line),
            Self::GrblCurrentStatus(status) => json!({
                "activeState": state_name(&status.state),
                "machinePos": { "x": status.machine_pos.x, "y": status.machine_pos.y, "z": status.machine_pos.z },
                "workingPos": { "x": status.work_pos.x, "y": status.work_pos.y, "z": status.work_pos.z },
            }),
            Self::GrblGcodeModes(tokens) => json!(tokens),
            Self::GcodeQueueStatus { executed, total } => {
                json!({ "executed": executed, "total": total })
            }
        }
    }
}

fn state_name(state: &GrblState) -> String {
    state.to_string()
}
