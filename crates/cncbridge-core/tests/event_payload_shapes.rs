//! Integration coverage for the server->client event payload shapes
//! (the JSON a socket layer would actually put on the wire).

use cncbridge_core::data::{AxisTriple, GrblState, StatusReport};
use cncbridge_core::{PortInfo, ServerEvent};

#[test]
fn current_status_payload_matches_the_documented_shape() {
    let event = ServerEvent::GrblCurrentStatus(StatusReport {
        state: GrblState::Idle,
        machine_pos: AxisTriple::new("5.529", "0.560", "7.000"),
        work_pos: AxisTriple::new("1.529", "-5.440", "-0.000"),
    });

    assert_eq!(event.name(), "grbl:current-status");
    assert_eq!(
        event.payload(),
        serde_json::json!({
            "activeState": "Idle",
            "machinePos": { "x": "5.529", "y": "0.560", "z": "7.000" },
            "workingPos": { "x": "1.529", "y": "-5.440", "z": "-0.000" },
        })
    );
}

#[test]
fn gcode_modes_payload_is_a_bare_token_array() {
    let tokens = vec!["G0", "G54", "G17", "G21", "G90", "G94", "M0", "M5", "M9", "T0", "F2540.", "S0."]
        .into_iter()
        .map(String::from)
        .collect();
    let event = ServerEvent::GrblGcodeModes(tokens);

    assert_eq!(event.name(), "grbl:gcode-modes");
    assert_eq!(
        event.payload(),
        serde_json::json!(["G0", "G54", "G17", "G21", "G90", "G94", "M0", "M5", "M9", "T0", "F2540.", "S0."])
    );
}

#[test]
fn queue_status_payload_carries_executed_and_total() {
    let event = ServerEvent::GcodeQueueStatus { executed: 1, total: 3 };
    assert_eq!(event.name(), "gcode:queue-status");
    assert_eq!(event.payload(), serde_json::json!({ "executed": 1, "total": 3 }));
}

#[test]
fn serial_port_list_serializes_each_port_entry() {
    let event = ServerEvent::SerialPortList(vec![
        PortInfo { port: "/dev/ttyUSB0".into(), manufacturer: Some("FTDI".into()), inuse: true },
        PortInfo { port: "/dev/ttyACM0".into(), manufacturer: None, inuse: false },
    ]);
    assert_eq!(event.name(), "serialport:list");
    assert_eq!(
        event.payload(),
        serde_json::json!([
            { "port": "/dev/ttyUSB0", "manufacturer": "FTDI", "inuse": true },
            { "port": "/dev/ttyACM0", "manufacturer": null, "inuse": false },
        ])
    );
}
