// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::shutdown::wait_for_drain;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop on `listener`.
///
/// Must be polled inside a `LocalSet`: connections are served by local
/// tasks. Returns after a shutdown request once active connections have
/// finished or `performance.shutdown_timeout` has passed.
pub async fn run_server(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
) {
    loop {
        tokio::select! {
            biased;

            () = state.shutdown.notified() => break,

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
        }
    }

    // Stop accepting, then ask open connections to finish
    drop(listener);
    state.begin_drain();

    let timeout_secs = state.config.performance.shutdown_timeout;
    logger::log_shutdown_draining(active_connections.load(Ordering::SeqCst), timeout_secs);
    let remaining =
        wait_for_drain(&active_connections, Duration::from_secs(timeout_secs)).await;
    logger::log_shutdown_complete(remaining);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::message::MESSAGE;
    use crate::server::create_reusable_listener;
    use http_body_util::{BodyExt, Empty};
    use hyper::body::Bytes;
    use hyper::client::conn::http1;
    use hyper::{Request, StatusCode};
    use hyper_util::rt::TokioIo;
    use std::net::SocketAddr;
    use tokio::net::TcpStream;
    use tokio::task::LocalSet;

    fn test_config() -> Config {
        let mut cfg = Config::load_from("does/not/exist/config").unwrap();
        cfg.logging.access_log = false;
        cfg.performance.shutdown_timeout = 1;
        cfg
    }

    struct TestServer {
        addr: SocketAddr,
        state: Arc<AppState>,
        active: Arc<AtomicUsize>,
        handle: tokio::task::JoinHandle<()>,
    }

    fn start_server(cfg: &Config) -> TestServer {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(cfg));
        let active = Arc::new(AtomicUsize::new(0));
        let handle = tokio::task::spawn_local(run_server(
            listener,
            Arc::clone(&state),
            Arc::clone(&active),
        ));
        TestServer {
            addr,
            state,
            active,
            handle,
        }
    }

    async fn start(cfg: &Config) -> (SocketAddr, Arc<AppState>, tokio::task::JoinHandle<()>) {
        let server = start_server(cfg);
        (server.addr, server.state, server.handle)
    }

    /// Open a keep-alive client connection and complete one request on it
    async fn keep_alive_client(
        addr: SocketAddr,
    ) -> (
        http1::SendRequest<Empty<Bytes>>,
        tokio::task::JoinHandle<hyper::Result<()>>,
    ) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
        let conn_task = tokio::task::spawn_local(conn);

        let req = Request::builder()
            .uri("/api/message")
            .header("Host", addr.to_string())
            .body(Empty::<Bytes>::new())
            .unwrap();
        let resp = sender.send_request(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let _ = resp.into_body().collect().await.unwrap();
        (sender, conn_task)
    }

    async fn get(addr: SocketAddr, path: &str) -> hyper::Result<(StatusCode, Bytes)> {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await?;
        tokio::task::spawn_local(async move {
            let _ = conn.await;
        });

        let req = Request::builder()
            .uri(path)
            .header("Host", addr.to_string())
            .body(Empty::<Bytes>::new())
            .unwrap();
        let resp = sender.send_request(req).await?;
        let status = resp.status();
        let body = resp.into_body().collect().await?.to_bytes();
        Ok((status, body))
    }

    #[tokio::test]
    async fn test_end_to_end_message() {
        LocalSet::new()
            .run_until(async {
                let (addr, state, handle) = start(&test_config()).await;

                let (status, body) = get(addr, "/api/message").await.unwrap();
                assert_eq!(status, StatusCode::OK);
                let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
                assert_eq!(value, serde_json::json!({ "message": MESSAGE }));

                state.request_shutdown();
                handle.await.unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_concurrent_requests_identical() {
        LocalSet::new()
            .run_until(async {
                let (addr, state, handle) = start(&test_config()).await;

                let (first, second) =
                    tokio::join!(get(addr, "/api/message"), get(addr, "/api/message"));
                let (first, second) = (first.unwrap(), second.unwrap());
                assert_eq!(first.0, StatusCode::OK);
                assert_eq!(first, second);

                state.request_shutdown();
                handle.await.unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_unknown_path_over_tcp() {
        LocalSet::new()
            .run_until(async {
                let (addr, state, handle) = start(&test_config()).await;

                let (status, _) = get(addr, "/missing").await.unwrap();
                assert_eq!(status, StatusCode::NOT_FOUND);

                state.request_shutdown();
                handle.await.unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_connection_limit_rejects_excess() {
        LocalSet::new()
            .run_until(async {
                let mut cfg = test_config();
                cfg.performance.max_connections = Some(1);
                let (addr, state, handle) = start(&cfg).await;

                // Hold one keep-alive connection open
                let (sender, _conn_task) = keep_alive_client(addr).await;

                assert!(get(addr, "/api/message").await.is_err());

                drop(sender);
                state.request_shutdown();
                handle.await.unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        LocalSet::new()
            .run_until(async {
                let (addr, state, handle) = start(&test_config()).await;

                state.request_shutdown();
                handle.await.unwrap();

                assert!(TcpStream::connect(addr).await.is_err());
            })
            .await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_keep_alive() {
        LocalSet::new()
            .run_until(async {
                let mut cfg = test_config();
                cfg.performance.shutdown_timeout = 3;
                let server = start_server(&cfg);

                let (_sender, conn_task) = keep_alive_client(server.addr).await;
                assert_eq!(server.active.load(Ordering::SeqCst), 1);

                let started = std::time::Instant::now();
                server.state.request_shutdown();
                server.handle.await.unwrap();

                assert!(
                    started.elapsed() < Duration::from_secs(1),
                    "drain took {:?}",
                    started.elapsed()
                );
                assert_eq!(server.active.load(Ordering::SeqCst), 0);

                // Server closed its side, so the client connection finishes too
                let closed = tokio::time::timeout(Duration::from_secs(1), conn_task).await;
                assert!(closed.is_ok());
            })
            .await;
    }

    #[tokio::test]
    async fn test_keep_alive_disabled_closes_after_response() {
        LocalSet::new()
            .run_until(async {
                let mut cfg = test_config();
                cfg.performance.keep_alive_timeout = 0;
                let server = start_server(&cfg);

                let (_sender, conn_task) = keep_alive_client(server.addr).await;
                let closed = tokio::time::timeout(Duration::from_secs(2), conn_task).await;
                assert!(closed.is_ok());

                server.state.request_shutdown();
                server.handle.await.unwrap();
            })
            .await;
    }
}
