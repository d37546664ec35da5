//! Client registry & event bus (C5) and the process-wide port registry.
//!
//! Grounded on the per-client fan-out pattern used by the teacher's web
//! pendant (`HashMap<ClientId, mpsc::UnboundedSender<_>>`, retained on
//! send failure) rather than a generic broadcast bus, because C5 needs
//! true unicast-to-originator semantics (`last_command` routing) that a
//! plain broadcast channel cannot express.

use crate::event::ServerEvent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Opaque per-connection identity, handed out by [`ClientRegistry::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

impl ClientId {
    fn next() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-client state tracked by a Session (§3 `ClientBinding`).
struct ClientBinding {
    sink: mpsc::UnboundedSender<ServerEvent>,
    last_command: Option<String>,
}

/// The set of clients currently attached to one Session/port.
///
/// One `ClientRegistry` is owned by each `GrblSession`; it never reaches
/// across ports, matching §9's "no cycle" design note (the bus resolves
/// client ids to sinks at emit time, the Session never touches another
/// Session's clients).
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, ClientBinding>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Attach a new client, returning the id it should use to `detach`.
    pub fn attach(&self, sink: mpsc::UnboundedSender<ServerEvent>) -> ClientId {
        let id = ClientId::next();
        self.clients.lock().insert(
            id,
            ClientBinding {
                sink,
                last_command: None,
            },
        );
        id
    }

    /// Detach a client. Returns the number of clients remaining.
    pub fn detach(&self, id: ClientId) -> usize {
        let mut clients = self.clients.lock();
        clients.remove(&id);
        clients.len()
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Record the raw payload of a client's most recent `serialport:write`.
    pub fn set_last_command(&self, id: ClientId, command: String) {
        if let Some(binding) = self.clients.lock().get_mut(&id) {
            binding.last_command = Some(command);
        }
    }

    /// Send `event` to every attached client. Dead sinks are pruned.
    pub fn broadcast(&self, event: ServerEvent) {
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain(|_, binding| binding.sink.send(event.clone()).is_ok());
        if clients.len() != before {
            tracing::debug!(pruned = before - clients.len(), "dropped dead client sinks on broadcast");
        }
    }

    /// Send `event` to exactly one client, addressed by id.
    pub fn unicast(&self, id: ClientId, event: ServerEvent) {
        let mut clients = self.clients.lock();
        if let Some(binding) = clients.get(&id) {
            if binding.sink.send(event).is_err() {
                tracing::debug!(%id, "dropped dead client sink on unicast");
                clients.remove(&id);
            }
        }
    }

    /// Deliver `event` to every client whose `last_command` satisfies
    /// `predicate`, clearing `last_command` on each match when
    /// `clear_on_match` is set.
    pub fn deliver_to_matching(
        &self,
        predicate: impl Fn(&str) -> bool,
        event: ServerEvent,
        clear_on_match: bool,
    ) {
        let mut clients = self.clients.lock();
        let mut dead = Vec::new();
        for (id, binding) in clients.iter_mut() {
            let matches = binding
                .last_command
                .as_deref()
                .map(&predicate)
                .unwrap_or(false);
            if matches {
                if binding.sink.send(event.clone()).is_err() {
                    dead.push(*id);
                } else if clear_on_match {
                    binding.last_command = None;
                }
            }
        }
        for id in dead {
            clients.remove(&id);
        }
    }
}

/// Process-wide `port -> Session` map (§3 "Port registry").
///
/// Generic over the Session type so the core crate never depends on the
/// communication crate's `GrblSession`; concurrent access is limited to
/// attach/detach/list (§5), so a single coarse lock suffices.
pub struct PortRegistry<S> {
    sessions: Mutex<HashMap<String, Arc<S>>>,
}

impl<S> Default for PortRegistry<S> {
    fn default() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl<S> PortRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, port: &str) -> Option<Arc<S>> {
        self.sessions.lock().get(port).cloned()
    }

    /// Get the existing session for `port`, or insert one built by `make`.
    pub fn get_or_create(&self, port: &str, make: impl FnOnce() -> Arc<S>) -> Arc<S> {
        self.sessions
            .lock()
            .entry(port.to_string())
            .or_insert_with(make)
            .clone()
    }

    pub fn remove(&self, port: &str) -> Option<Arc<S>> {
        self.sessions.lock().remove(port)
    }

    pub fn ports(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }

    pub fn contains(&self, port: &str) -> bool {
        self.sessions.lock().contains_key(port)
    }
}
