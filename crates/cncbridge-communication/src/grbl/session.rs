//! Grbl Session (C4) — the per-port coordinator.
//!
//! Owns a [`SerialLineTransport`] (C1), runs incoming lines through
//! [`classify`] (C2), drives a [`CommandQueue`] (C3), and fans results out
//! through a [`ClientRegistry`] (C5). The connection state machine, the
//! 250 ms poll scheduler, and the reply-dispatch priority order follow
//! §4.4 exactly; nothing here re-derives them from first principles.

use crate::grbl::error_decoder::{format_alarm, format_error};
use crate::grbl::parser::classify;
use crate::transport::{OpenParams, SerialLineTransport, TransportEvent};
use cncbridge_core::{ClientId, ClientRegistry, Error, GrblLine, PortRegistry, Result, ServerEvent, SessionError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::queue::CommandQueue;

/// The three poll/ack flags tracked while a Session is `ready` (§3).
#[derive(Debug, Clone, Copy, Default)]
struct Pending {
    status_poll: bool,
    gstate_poll: bool,
    gstate_awaiting_ack: bool,
}

/// Per-port coordinator. One instance lives per open serial port, held by
/// the process-wide [`PortRegistry`].
pub struct GrblSession {
    port: String,
    baud: u32,
    transport: Mutex<Option<SerialLineTransport>>,
    ready: AtomicBool,
    pending: Mutex<Pending>,
    queue: Mutex<CommandQueue>,
    gcode_text: Mutex<String>,
    last_reported: Mutex<(usize, usize)>,
    clients: ClientRegistry,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    queue_status_task: Mutex<Option<JoinHandle<()>>>,
    event_task: Mutex<Option<JoinHandle<()>>>,
    registry: Weak<PortRegistry<GrblSession>>,
}

impl GrblSession {
    pub fn new(port: String, baud: u32, registry: Weak<PortRegistry<GrblSession>>) -> Arc<Self> {
        Arc::new(Self {
            port,
            baud,
            transport: Mutex::new(None),
            ready: AtomicBool::new(false),
            pending: Mutex::new(Pending::default()),
            queue: Mutex::new(CommandQueue::new()),
            gcode_text: Mutex::new(String::new()),
            last_reported: Mutex::new((0, 0)),
            clients: ClientRegistry::new(),
            poll_task: Mutex::new(None),
            queue_status_task: Mutex::new(None),
            event_task: Mutex::new(None),
            registry,
        })
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn baud(&self) -> u32 {
        self.baud
    }

    pub fn is_open(&self) -> bool {
        self.transport.lock().is_some()
    }

    pub fn attach(&self, sink: mpsc::UnboundedSender<ServerEvent>) -> ClientId {
        self.clients.attach(sink)
    }

    /// Detach a client, returning the number of clients still attached.
    pub fn detach(&self, id: ClientId) -> usize {
        self.clients.detach(id)
    }

    pub fn client_count(&self) -> usize {
        self.clients.client_count()
    }

    /// Send `event` to exactly one attached client.
    pub fn notify(&self, client: ClientId, event: ServerEvent) {
        self.clients.unicast(client, event);
    }

    /// Drive `Closed -> Opening -> Resetting -> WaitBoot`. `Ready` is
    /// entered asynchronously once a `Boot` line is classified.
    pub fn open(self: &Arc<Self>, initiating_client: ClientId) -> Result<()> {
        if self.is_open() {
            self.clients.unicast(
                initiating_client,
                ServerEvent::SerialPortOpen {
                    port: self.port.clone(),
                    baudrate: self.baud,
                    inuse: true,
                },
            );
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let transport = SerialLineTransport::open(
            OpenParams {
                port: self.port.clone(),
                baud: self.baud,
            },
            tx,
        )?;
        *self.transport.lock() = Some(transport);

        // Resetting.
        self.ready.store(false, Ordering::SeqCst);
        *self.pending.lock() = Pending::default();
        self.gcode_text.lock().clear();
        {
            let mut queue = self.queue.lock();
            queue.stop();
            queue.clear();
        }
        self.clients.unicast(
            initiating_client,
            ServerEvent::SerialPortOpen {
                port: self.port.clone(),
                baudrate: self.baud,
                inuse: true,
            },
        );

        if let Some(t) = self.transport.lock().as_ref() {
            t.write(&[0x18])?;
        }

        let session = Arc::clone(self);
        let handle = tokio::spawn(async move { session.run_event_loop(rx).await });
        *self.event_task.lock() = Some(handle);

        self.start_timers();
        Ok(())
    }

    /// `close(port)` router path: closes the transport and cancels timers
    /// without waiting for a transport-level close/error event.
    pub fn close_transport(&self) {
        *self.transport.lock() = None;
        self.ready.store(false, Ordering::SeqCst);
        self.cancel_timers();
    }

    pub fn write_raw(&self, client: ClientId, payload: &str) -> Result<()> {
        {
            let transport = self.transport.lock();
            let Some(t) = transport.as_ref() else {
                return Err(Error::from(SessionError::NotOpen {
                    port: self.port.clone(),
                }));
            };
            t.write(payload.as_bytes())?;
        }
        self.clients.set_last_command(client, payload.to_string());
        Ok(())
    }

    pub fn queue_play(&self) -> Result<()> {
        self.require_open()?;
        if let Some(line) = self.queue.lock().play() {
            self.dispatch(&line);
        }
        Ok(())
    }

    pub fn queue_pause(&self) -> Result<()> {
        self.require_open()?;
        self.queue.lock().pause();
        Ok(())
    }

    pub fn queue_stop(&self) -> Result<()> {
        self.require_open()?;
        self.queue.lock().stop();
        Ok(())
    }

    pub fn queue_unload(&self) -> Result<()> {
        self.require_open()?;
        self.gcode_text.lock().clear();
        self.queue.lock().clear();
        Ok(())
    }

    /// C6 ingest support: stop, clear, and refill the queue. Does not
    /// require the transport to be open (§4.6 names no such precondition).
    pub fn load_program(&self, gcode_text: String, lines: Vec<String>) {
        *self.gcode_text.lock() = gcode_text;
        let mut queue = self.queue.lock();
        queue.stop();
        queue.clear();
        queue.push(lines);
    }

    fn require_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::from(SessionError::NotOpen {
                port: self.port.clone(),
            }))
        }
    }

    fn dispatch(&self, line: &str) {
        let transport = self.transport.lock();
        if let Some(t) = transport.as_ref() {
            let mut bytes = line.as_bytes().to_vec();
            bytes.push(b'\n');
            if let Err(e) = t.write(&bytes) {
                tracing::warn!(port = %self.port, error = %e, "failed to dispatch queued line");
            }
        }
    }

    fn start_timers(self: &Arc<Self>) {
        let poll_session = Arc::clone(self);
        let poll_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(250));
            loop {
                ticker.tick().await;
                poll_session.poll_tick();
            }
        });
        *self.poll_task.lock() = Some(poll_handle);

        let qs_session = Arc::clone(self);
        let qs_handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(250));
            loop {
                ticker.tick().await;
                qs_session.queue_status_tick();
            }
        });
        *self.queue_status_task.lock() = Some(qs_handle);
    }

    fn cancel_timers(&self) {
        if let Some(h) = self.poll_task.lock().take() {
            h.abort();
        }
        if let Some(h) = self.queue_status_task.lock().take() {
            h.abort();
        }
    }

    fn poll_tick(&self) {
        if !self.ready.load(Ordering::SeqCst) {
            return;
        }
        let transport = self.transport.lock();
        let Some(t) = transport.as_ref() else {
            return;
        };
        let mut pending = self.pending.lock();
        if !pending.status_poll && t.write(b"?").is_ok() {
            pending.status_poll = true;
        }
        if !pending.gstate_poll && !pending.gstate_awaiting_ack && t.write(b"$G\n").is_ok() {
            pending.gstate_poll = true;
        }
    }

    fn queue_status_tick(&self) {
        let (executed, total) = {
            let queue = self.queue.lock();
            (queue.executed_count(), queue.size())
        };
        let mut last = self.last_reported.lock();
        if *last != (executed, total) {
            *last = (executed, total);
            self.clients
                .broadcast(ServerEvent::GcodeQueueStatus { executed, total });
        }
    }

    async fn run_event_loop(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<TransportEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                TransportEvent::Opened => {}
                TransportEvent::Line(line) => self.handle_line(&line),
                TransportEvent::Error(_) => {
                    self.teardown(true);
                    break;
                }
                TransportEvent::Closed => {
                    self.teardown(false);
                    break;
                }
            }
        }
    }

    /// §4.4's reply-dispatch priority order, applied to one classified line.
    fn handle_line(&self, raw: &str) {
        match classify(raw) {
            GrblLine::Boot => {
                *self.pending.lock() = Pending::default();
                self.ready.store(true, Ordering::SeqCst);
            }
            GrblLine::Status(report) => {
                self.clients.broadcast(ServerEvent::GrblCurrentStatus(report));
                self.clients.deliver_to_matching(
                    |cmd| cmd == "?",
                    ServerEvent::SerialPortData(raw.to_string()),
                    true,
                );
                self.pending.lock().status_poll = false;
            }
            GrblLine::ParserState(tokens) => {
                self.clients.broadcast(ServerEvent::GrblGcodeModes(tokens));
                self.clients.deliver_to_matching(
                    |cmd| cmd.starts_with("$G"),
                    ServerEvent::SerialPortData(raw.to_string()),
                    false,
                );
                let mut pending = self.pending.lock();
                pending.gstate_poll = false;
                pending.gstate_awaiting_ack = true;
            }
            GrblLine::AckError(code) => {
                if let Ok(code) = code.trim().parse::<u8>() {
                    tracing::debug!(port = %self.port, %code, "{}", format_error(code));
                }
                self.handle_ack(raw);
            }
            GrblLine::AckOk => {
                self.handle_ack(raw);
            }
            GrblLine::Other(line) => {
                if let Some(code) = line.strip_prefix("ALARM:").and_then(|s| s.trim().parse::<u8>().ok()) {
                    tracing::warn!(port = %self.port, %code, "{}", format_alarm(code));
                }
                if !line.is_empty() {
                    self.clients.broadcast(ServerEvent::SerialPortData(line));
                }
            }
        }
    }

    /// Shared tail of `AckOk`/`AckError` handling once any error-code
    /// logging for the specific variant is done (§4.4 step 4).
    fn handle_ack(&self, raw: &str) {
        let gstate_awaiting = self.pending.lock().gstate_awaiting_ack;
        if gstate_awaiting {
            self.clients.deliver_to_matching(
                |cmd| cmd.starts_with("$G"),
                ServerEvent::SerialPortData(raw.to_string()),
                true,
            );
            self.pending.lock().gstate_awaiting_ack = false;
            return;
        }
        if self.queue.lock().is_running() {
            if let Some(next_line) = self.queue.lock().next() {
                self.dispatch(&next_line);
            }
            return;
        }
        if !raw.is_empty() {
            self.clients.broadcast(ServerEvent::SerialPortData(raw.to_string()));
        }
    }

    fn teardown(&self, is_error: bool) {
        if is_error {
            self.clients.broadcast(ServerEvent::SerialPortError {
                port: self.port.clone(),
            });
        } else {
            self.clients.broadcast(ServerEvent::SerialPortClose {
                port: self.port.clone(),
                inuse: false,
            });
        }
        *self.transport.lock() = None;
        self.ready.store(false, Ordering::SeqCst);
        self.cancel_timers();
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cncbridge_core::PortRegistry;

    fn session() -> Arc<GrblSession> {
        let registry: Arc<PortRegistry<GrblSession>> = Arc::new(PortRegistry::new());
        GrblSession::new("/dev/ttyUSB0".to_string(), 115200, Arc::downgrade(&registry))
    }

    #[test]
    fn operations_on_unopened_session_are_rejected() {
        let session = session();
        let (tx, _rx) = mpsc::unbounded_channel();
        let client = session.attach(tx);
        assert!(session.queue_play().is_err());
        assert!(session.queue_pause().is_err());
        assert!(session.queue_stop().is_err());
        assert!(session.queue_unload().is_err());
        assert!(session.write_raw(client, "?").is_err());
    }

    #[test]
    fn load_program_does_not_require_open_transport() {
        let session = session();
        session.load_program(
            "G0 X10\nG0 Y10".to_string(),
            vec!["G0 X10".to_string(), "G0 Y10".to_string()],
        );
        // Queue state is internal, but load_program must not error or panic
        // on a session with no transport.
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn ack_without_gstate_or_running_queue_broadcasts_as_data() {
        let session = session();
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.attach(tx);
        session.handle_line("ok");
        let event = rx.try_recv().expect("expected a broadcast event");
        assert_eq!(event.name(), "serialport:data");
    }

    #[tokio::test]
    async fn boot_line_clears_pending_and_sets_ready() {
        let session = session();
        session.pending.lock().status_poll = true;
        session.handle_line("Grbl 0.9j ['$' for help]");
        assert!(session.ready.load(Ordering::SeqCst));
        assert!(!session.pending.lock().status_poll);
    }

    #[tokio::test]
    async fn gstate_cycle_is_consumed_before_queue_next() {
        let session = session();
        session.queue.lock().push(vec!["G0 X1".to_string()]);
        session.queue.lock().play();
        session.handle_line("[G0 G54 G17 G21 G90 G94 M0 M5 M9 T0 F2540. S0.]");
        assert!(session.pending.lock().gstate_awaiting_ack);
        // The ack belongs to the $G cycle, not the queue: executed_count
        // must not advance.
        session.handle_line("ok");
        assert_eq!(session.queue.lock().executed_count(), 0);
        assert!(!session.pending.lock().gstate_awaiting_ack);
    }
}
