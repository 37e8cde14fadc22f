// Server loop module
// Accepts connections until a shutdown is requested, then drains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config;
use crate::logger;

/// How often the drain phase re-checks the connection counter
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept loop for the wiki server
///
/// Returns once `signals` requests shutdown and in-flight connections have
/// finished, or the write timeout has elapsed.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    signals: Arc<SignalHandler>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = signals.shutdown.notified() => {
                if signals.is_shutdown_requested() {
                    logger::log_info("[SHUTDOWN] No longer accepting connections");
                    break;
                }
            }
        }
    }

    // Stop accepting before draining
    drop(listener);

    let grace = Duration::from_secs(state.config.performance.write_timeout);
    let drained = drain_connections(&active_connections, grace).await;
    if drained {
        logger::log_info("[SHUTDOWN] All connections closed, bye");
    } else {
        logger::log_warning(&format!(
            "[SHUTDOWN] {} connections still open after {}s, exiting anyway",
            active_connections.load(Ordering::SeqCst),
            grace.as_secs()
        ));
    }

    Ok(())
}

/// Wait until no connection is active, `false` if `grace` ran out first
async fn drain_connections(active_connections: &AtomicUsize, grace: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        logger::log_debug(&format!("[SHUTDOWN] Waiting for {remaining} connections"));
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
