//! Static file server applying the tidy processor to HTML responses.

mod path;
mod response;

use anyhow::Result;
use std::{
    net::SocketAddr,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};
use tiny_http::{Request, Server};

use crate::config::Config;
use crate::log;
use crate::tidy::TidyProcessor;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// Before the server is bound the process just exits; afterwards the
/// handler unblocks the request loop so it can drain and return.
pub fn setup_shutdown_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })?;
    Ok(())
}

fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: std::net::IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

/// Bind and run the request loop (blocking until shutdown).
pub fn run(config: &Config) -> Result<()> {
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    let _ = SERVER.set(Arc::clone(&server));

    // One immutable processor for the lifetime of the server; every request
    // gets an independent invocation.
    let processor = TidyProcessor::new(&config.tidy);

    log!("serve"; "http://{} -> {}", addr, config.serve.root.display());

    for request in server.incoming_requests() {
        if is_shutdown() {
            let _ = response::respond_unavailable(request);
            continue;
        }
        if let Err(e) = handle_request(request, config, &processor) {
            log!("serve"; "request error: {e}");
        }
    }
    Ok(())
}

fn handle_request(request: Request, config: &Config, processor: &TidyProcessor) -> Result<()> {
    match path::resolve(request.url(), &config.serve.root) {
        Some(path) => response::respond_file(request, &path, config, processor),
        None => response::respond_not_found(request, config),
    }
}
