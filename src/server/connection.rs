// Connection handling module
// Accepts a single TCP connection and serves it over HTTP/1.1

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpStream;

use crate::config::{AppState, PerformanceConfig};
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `max_connections`.
///
/// The counter is incremented before the limit check, and rolled back when
/// the connection is rejected.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    graceful: &GracefulShutdown,
) {
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state), graceful);
}

/// Serve a connection in a spawned task.
///
/// The connection is registered with `graceful`, so shutdown closes it once
/// the response in flight (if any) is written. The active connection counter
/// is decremented when the task ends.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    graceful: &GracefulShutdown,
) {
    let io = TokioIo::new(stream);

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .keep_alive(state.config.performance.keep_alive_timeout > 0)
        .header_read_timeout(head_timeout(&state.config.performance));

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| {
            handler::handle_request(req, peer_addr, Arc::clone(&service_state))
        }),
    );
    let conn = graceful.watch(conn);

    tokio::spawn(async move {
        match conn.await {
            Ok(()) => {}
            // Idle connection reached its head timeout
            Err(err) if err.is_timeout() => {}
            Err(err) => logger::log_connection_error(&err),
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Longest wait for a request head, the first one or the next on a kept-alive connection
///
/// Expiry closes the connection between requests, never during a response.
fn head_timeout(perf: &PerformanceConfig) -> Duration {
    if perf.keep_alive_timeout > 0 {
        Duration::from_secs(perf.keep_alive_timeout)
    } else {
        Duration::from_secs(perf.read_timeout)
    }
}
