//! Server module entry point
//!
//! Accept loop, listener setup and shutdown signalling

pub mod connection;
pub mod listener;
pub mod signal;

pub use listener::create_reusable_listener;

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::AppState;
use crate::logger;

/// Upper bound on how long in-flight connections may drain after shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept connections until a shutdown signal arrives, then drain.
pub async fn run(listener: TcpListener, state: Arc<AppState>) {
    run_until(listener, state, signal::shutdown_signal()).await;
}

/// Accept loop driven by an arbitrary shutdown future
pub async fn run_until<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: std::future::Future<Output = &'static str>,
{
    let mut tasks = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            reason = &mut shutdown => {
                logger::log_shutdown(reason);
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    connection::accept_connection(&mut tasks, stream, peer_addr, &state);
                }
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            // Reap finished connection tasks
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    let drain = async { while tasks.join_next().await.is_some() {} };
    if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
        logger::log_warning(&format!(
            "Aborting {} connection(s) still open after {}s",
            tasks.len(),
            DRAIN_TIMEOUT.as_secs()
        ));
        tasks.shutdown().await;
    }
}
