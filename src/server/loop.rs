// Server loop module
// Accepts connections until shutdown is requested, then waits for in-flight ones

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How often the drain phase re-checks the active connection count
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop on the current `LocalSet`.
///
/// Returns once `state.shutdown` is notified and in-flight connections have
/// finished or the drain deadline (the write timeout) has passed.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = state.shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    drop(listener);
    drain_connections(&state).await;
}

async fn drain_connections(state: &AppState) {
    let deadline = tokio::time::Instant::now()
        + Duration::from_secs(state.config.performance.write_timeout);

    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 {
            logger::log_info("All connections closed");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown deadline reached with {active} connection(s) still open"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn send_raw(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    /// Like `send_raw`, but a reset from the server reads as an empty response
    async fn send_lenient(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let _ = stream.write_all(request.as_bytes()).await;
        let mut response = Vec::new();
        let _ = stream.read_to_end(&mut response).await;
        String::from_utf8_lossy(&response).into_owned()
    }

    async fn wait_for_active(state: &AppState, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while state.active_connections.load(Ordering::SeqCst) != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("active connections never reached {expected}"));
    }

    fn get(path: &str) -> String {
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
    }

    #[tokio::test]
    async fn test_serves_over_tcp_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("credit_scores.csv");
        std::fs::write(&csv_path, "name,score\nAlice,700\nBob,640\n").unwrap();

        let mut cfg = Config::load_from("/nonexistent/credit-score-config").unwrap();
        cfg.data.csv_path = csv_path.to_string_lossy().into_owned();
        cfg.app.debug = false;
        cfg.logging.access_log = false;
        let state = Arc::new(AppState::new(&cfg));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(listener, Arc::clone(&state)));

                let ok = send_raw(addr, &get("/api/credit-score")).await;
                assert!(ok.starts_with("HTTP/1.1 200 OK\r\n"), "{ok}");
                assert!(ok.to_ascii_lowercase().contains("content-type: application/json"));
                assert!(ok.ends_with(
                    r#"[{"name":"Alice","score":"700"},{"name":"Bob","score":"640"}]"#
                ));

                std::fs::remove_file(&csv_path).unwrap();
                let missing = send_raw(addr, &get("/api/credit-score")).await;
                assert!(missing.starts_with("HTTP/1.1 404 Not Found\r\n"), "{missing}");
                assert!(missing.ends_with(r#"{"error":"CSV file not found"}"#));

                state.shutdown.notify_one();
                tokio::time::timeout(Duration::from_secs(5), server)
                    .await
                    .expect("server loop did not stop")
                    .unwrap();
            })
            .await;

        assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connections_over_limit_are_closed() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("credit_scores.csv");
        std::fs::write(&csv_path, "name,score\nAlice,700\n").unwrap();

        let mut cfg = Config::load_from("/nonexistent/credit-score-config").unwrap();
        cfg.data.csv_path = csv_path.to_string_lossy().into_owned();
        cfg.app.debug = false;
        cfg.logging.access_log = false;
        cfg.performance.max_connections = Some(1);
        let state = Arc::new(AppState::new(&cfg));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(listener, Arc::clone(&state)));

                // An idle client holds the only slot
                let idle = TcpStream::connect(addr).await.unwrap();
                wait_for_active(&state, 1).await;

                let rejected = send_lenient(addr, &get("/api/credit-score")).await;
                assert!(rejected.is_empty(), "{rejected}");
                assert_eq!(state.active_connections.load(Ordering::SeqCst), 1);

                drop(idle);
                wait_for_active(&state, 0).await;

                let ok = send_raw(addr, &get("/api/credit-score")).await;
                assert!(ok.starts_with("HTTP/1.1 200 OK\r\n"), "{ok}");
                assert!(ok.ends_with(r#"[{"name":"Alice","score":"700"}]"#));

                state.shutdown.notify_one();
                tokio::time::timeout(Duration::from_secs(5), server)
                    .await
                    .expect("server loop did not stop")
                    .unwrap();
            })
            .await;

        assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);
    }
}
