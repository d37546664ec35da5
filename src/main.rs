use cncbridge::{init_logging, CommandRouter, Config, GrblSession, PortRegistry};
use std::sync::Arc;

/// There is no socket/CLI surface here (§1 scopes that out); this binary
/// only proves the bridge wires together: it loads configuration, builds
/// the process-wide port registry and command router, lists what it
/// would advertise to a client, and idles until interrupted. A real
/// deployment drives `CommandRouter` from a socket layer outside this
/// crate.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = Config::load();
    let registry: Arc<PortRegistry<GrblSession>> = Arc::new(PortRegistry::new());
    let router = CommandRouter::new(Arc::clone(&registry), config);

    for port in router.list() {
        tracing::info!(port = %port.port, inuse = port.inuse, "available serial port");
    }

    tracing::info!("cncbridge ready, waiting for a client to open a port");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
