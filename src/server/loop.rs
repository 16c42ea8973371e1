// Server loop module
// Accepts connections until shutdown, then closes them gracefully

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Longest time to wait for open connections after shutdown
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Run the accept loop until `shutdown` is notified
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &graceful);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.notified() => break,
        }
    }

    // Stop accepting before closing connections
    drop(listener);
    logger::log_shutdown(state.active_connections.load(Ordering::SeqCst));
    close_connections(graceful, &state, SHUTDOWN_GRACE_PERIOD).await;
}

/// Ask every connection to close once its current response is written, and
/// wait for them for at most `grace`
async fn close_connections(graceful: GracefulShutdown, state: &AppState, grace: Duration) {
    if tokio::time::timeout(grace, graceful.shutdown()).await.is_ok() {
        logger::log_info("All connections closed");
    } else {
        logger::log_warning(&format!(
            "Shutdown grace period elapsed with {} connection(s) still open",
            state.active_connections.load(Ordering::SeqCst)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiBackend, UnconfiguredApi};
    use crate::config::Config;
    use crate::handler::{Dispatcher, FallbackDocument, ServerInfo, StaticRoot};
    use crate::server::create_reusable_listener;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    fn state(root: &std::path::Path, keep_alive_timeout: u64) -> Arc<AppState> {
        let mut config = Config::load_from("does/not/exist/config").unwrap();
        config.logging.access_log = false;
        config.performance.keep_alive_timeout = keep_alive_timeout;
        let dispatcher = Dispatcher::new(
            StaticRoot::new(root).unwrap(),
            FallbackDocument::from_bytes("<html>app</html>"),
            ServerInfo {
                message: "Loop Test".to_string(),
                version: "v0".to_string(),
            },
            ApiBackend::Unconfigured(UnconfiguredApi),
        );
        Arc::new(AppState::new(config, dispatcher))
    }

    fn spawn_server(state: &Arc<AppState>) -> (SocketAddr, Arc<Notify>, JoinHandle<()>) {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::clone(state),
            Arc::clone(&shutdown),
        ));
        (addr, shutdown, server)
    }

    #[tokio::test]
    async fn test_serves_then_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), 75);
        let (addr, shutdown, server) = spawn_server(&state);

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.ends_with(r#"{"message":"Loop Test","version":"v0"}"#), "{raw}");

        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_keep_alive_does_not_delay_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), 75);
        let (addr, shutdown, server) = spawn_server(&state);

        // One keep-alive exchange, then leave the connection idle
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"HEAD /x HTTP/1.1\r\nHost: test\r\n\r\n")
            .await
            .unwrap();
        let mut buf = [0_u8; 1024];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(buf[..n].starts_with(b"HTTP/1.1 200 OK"));
        assert_eq!(state.active_connections.load(Ordering::SeqCst), 1);

        let started = tokio::time::Instant::now();
        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .unwrap()
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));

        // The server closed its side of the idle connection
        let closed = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .unwrap();
        assert!(matches!(closed, Ok(0) | Err(_)));
    }

    #[tokio::test]
    async fn test_idle_connection_closed_after_keep_alive_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), 1);
        let (addr, shutdown, _server) = spawn_server(&state);

        // Connect and never send a request head
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut buf = Vec::new();
        let closed = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf));
        assert!(closed.await.is_ok(), "idle connection was not closed");

        shutdown.notify_one();
    }
}
