//! Command Router (C7).
//!
//! Maps the inbound client events of §6's client protocol onto operations
//! against the Session (C4), queue (C3), and client registry (C5). Every
//! "require transport open" failure is logged and dropped silently — no
//! error event goes back to the client, a deliberate choice preserved
//! from the distilled spec for compatibility with existing clients.

use crate::config::Config;
use cncbridge_communication::{list_ports, GrblSession};
use cncbridge_core::{ClientId, PortInfo, PortRegistry, Result, ServerEvent};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct CommandRouter {
    registry: Arc<PortRegistry<GrblSession>>,
    config: Config,
}

impl CommandRouter {
    pub fn new(registry: Arc<PortRegistry<GrblSession>>, config: Config) -> Self {
        Self { registry, config }
    }

    /// Enumerate OS serial ports, unioned with configured extras,
    /// annotated with whether a Session currently has them open.
    pub fn list(&self) -> Vec<PortInfo> {
        let mut seen = HashSet::new();
        let mut ports = Vec::new();

        for discovered in list_ports().unwrap_or_default() {
            if !seen.insert(discovered.port_name.clone()) {
                continue;
            }
            let inuse = self.is_open(&discovered.port_name);
            ports.push(PortInfo {
                port: discovered.port_name,
                manufacturer: discovered.manufacturer,
                inuse,
            });
        }

        for extra in &self.config.cnc.ports {
            if !seen.insert(extra.clone()) {
                continue;
            }
            let inuse = self.is_open(extra);
            ports.push(PortInfo {
                port: extra.clone(),
                manufacturer: None,
                inuse,
            });
        }

        ports
    }

    /// Get-or-create the Session for `port`, attach the client, and open
    /// the transport if it isn't already. Returns the session and the
    /// `ClientId` the caller must remember for subsequent commands.
    pub fn open(
        &self,
        sink: mpsc::UnboundedSender<ServerEvent>,
        port: &str,
        baud: u32,
    ) -> Result<(Arc<GrblSession>, ClientId)> {
        let registry = Arc::clone(&self.registry);
        let session = registry.get_or_create(port, || {
            GrblSession::new(port.to_string(), baud, Arc::downgrade(&registry))
        });
        let client = session.attach(sink);
        session.open(client)?;
        Ok((session, client))
    }

    /// Detach `client` from `port`'s Session. If it was the last client,
    /// close the transport and remove the Session from the registry.
    pub fn close(&self, port: &str, client: ClientId) {
        let Some(session) = self.registry.get(port) else {
            tracing::warn!(port, "dropped close: no such port");
            return;
        };
        let inuse_after = session.client_count() > 1;
        session.notify(
            client,
            ServerEvent::SerialPortClose {
                port: port.to_string(),
                inuse: inuse_after,
            },
        );
        if session.detach(client) == 0 {
            session.close_transport();
            self.registry.remove(port);
        }
    }

    pub fn write(&self, port: &str, client: ClientId, payload: &str) {
        self.require_open(port, |session| session.write_raw(client, payload));
    }

    pub fn run(&self, port: &str) {
        self.require_open(port, |session| session.queue_play());
    }

    pub fn pause(&self, port: &str) {
        self.require_open(port, |session| session.queue_pause());
    }

    pub fn stop(&self, port: &str) {
        self.require_open(port, |session| session.queue_stop());
    }

    pub fn unload(&self, port: &str) {
        self.require_open(port, |session| session.queue_unload());
    }

    fn is_open(&self, port: &str) -> bool {
        self.registry.get(port).map(|s| s.is_open()).unwrap_or(false)
    }

    fn require_open(&self, port: &str, action: impl FnOnce(&GrblSession) -> Result<()>) {
        let Some(session) = self.registry.get(port) else {
            tracing::warn!(port, "dropped command: no such port");
            return;
        };
        if let Err(e) = action(&session) {
            tracing::warn!(port, error = %e, "dropped command: transport not open");
        }
    }
}
