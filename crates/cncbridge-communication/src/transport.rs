//! Line Transport (C1).
//!
//! Opens a serial device at a requested baud rate and delivers complete
//! newline-terminated lines, with the trailing newline stripped, over an
//! mpsc channel. `serialport` performs blocking I/O, so the read loop runs
//! on a dedicated OS thread per open port — the thread-per-Session model
//! §5 explicitly allows — while writes are accepted from async code and
//! serialized behind a mutex.

use cncbridge_core::{Error, Result, TransportError};
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Parameters for opening a line transport.
#[derive(Debug, Clone)]
pub struct OpenParams {
    pub port: String,
    pub baud: u32,
}

/// Events emitted by a [`SerialLineTransport`] as they occur.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Opened,
    Line(String),
    Closed,
    Error(String),
}

/// One serial port's newline-framed read/write channel (C1).
pub struct SerialLineTransport {
    port: String,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    reader_handle: Option<std::thread::JoinHandle<()>>,
}

impl SerialLineTransport {
    /// Open the device and start the background line-reader thread.
    /// `events` receives `Opened`, then a `Line` per complete frame, then
    /// exactly one of `Closed`/`Error` when the device stops responding.
    pub fn open(params: OpenParams, events: mpsc::UnboundedSender<TransportEvent>) -> Result<Self> {
        let port = serialport::new(&params.port, params.baud)
            .timeout(Duration::from_millis(50))
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| {
                Error::from(TransportError::OpenError {
                    port: params.port.clone(),
                    reason: e.to_string(),
                })
            })?;

        let reader_port = port.try_clone().map_err(|e| {
            Error::from(TransportError::OpenError {
                port: params.port.clone(),
                reason: e.to_string(),
            })
        })?;

        let writer: Arc<Mutex<Box<dyn Write + Send>>> = Arc::new(Mutex::new(Box::new(port)));
        let port_name = params.port.clone();
        let _ = events.send(TransportEvent::Opened);

        let reader_handle = std::thread::spawn(move || {
            read_loop(reader_port, port_name, events);
        });

        Ok(Self {
            port: params.port,
            writer,
            reader_handle: Some(reader_handle),
        })
    }

    /// Transmit raw bytes. No framing is added — callers append their own
    /// newline if Grbl expects one.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().expect("transport writer lock poisoned");
        writer.write_all(bytes).map_err(|e| {
            Error::from(TransportError::WriteError {
                port: self.port.clone(),
                reason: e.to_string(),
            })
        })
    }
}

impl Drop for SerialLineTransport {
    fn drop(&mut self) {
        if let Some(handle) = self.reader_handle.take() {
            // The reader thread exits on its own once the port errors or
            // is dropped; we don't block Drop waiting for it.
            drop(handle);
        }
    }
}

fn read_loop(
    mut port: Box<dyn serialport::SerialPort>,
    port_name: String,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let mut buf = [0u8; 256];
    let mut pending = String::new();
    loop {
        match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                while let Some(idx) = pending.find('\n') {
                    let line = pending[..idx].trim_end_matches('\r').to_string();
                    pending.drain(..=idx);
                    if events.send(TransportEvent::Line(line)).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => continue,
            Err(e) => {
                tracing::warn!(port = %port_name, error = %e, "serial transport closed");
                let _ = events.send(TransportEvent::Error(e.to_string()));
                let _ = events.send(TransportEvent::Closed);
                return;
            }
        }
    }
}

/// Information about one discoverable serial port (C7 `list`).
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    pub port_name: String,
    pub manufacturer: Option<String>,
}

/// Enumerate OS serial ports, filtered to common CNC controller device
/// name patterns (USB/ACM on Linux, COM on Windows, cu.usb* on macOS).
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports()
        .map_err(|e| Error::other(format!("failed to enumerate serial ports: {}", e)))?;

    Ok(ports
        .into_iter()
        .filter(|p| is_valid_cnc_port(&p.port_name))
        .map(|p| {
            let manufacturer = match p.port_type {
                serialport::SerialPortType::UsbPort(usb) => usb.manufacturer,
                _ => None,
            };
            SerialPortInfo {
                port_name: p.port_name,
                manufacturer,
            }
        })
        .collect())
}

fn is_valid_cnc_port(port_name: &str) -> bool {
    if port_name.starts_with("COM") && port_name[3..].chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if port_name.starts_with("/dev/ttyUSB") || port_name.starts_with("/dev/ttyACM") {
        return true;
    }
    if port_name.starts_with("/dev/cu.usbserial-") || port_name.starts_with("/dev/cu.usbmodem") {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_cnc_port_patterns() {
        assert!(is_valid_cnc_port("/dev/ttyUSB0"));
        assert!(is_valid_cnc_port("/dev/ttyACM1"));
        assert!(is_valid_cnc_port("COM3"));
        assert!(is_valid_cnc_port("/dev/cu.usbmodem14101"));
        assert!(!is_valid_cnc_port("/dev/tty0"));
        assert!(!is_valid_cnc_port("lo"));
    }
}
