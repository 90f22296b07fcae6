//! Connection handling module
//!
//! Serves a single accepted TCP connection

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Spawn a task serving one connection into `tasks`.
///
/// The task:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive from the server settings
/// 3. Serves every request on the connection through the intake router
/// 4. Bounds the whole connection by max(read, write) timeout
pub fn accept_connection(
    tasks: &mut JoinSet<()>,
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
) {
    logger::log_debug(&format!("Accepted connection from {peer_addr}"));

    let state = Arc::clone(state);
    tasks.spawn(async move {
        let io = TokioIo::new(stream);

        let server = &state.config.server;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            server.read_timeout,
            server.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder.keep_alive(server.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }
    });
}
