//! Signal handling for graceful server shutdown.
//!
//! This module provides cross-platform signal handling so the server can tell
//! every connected client to `exit` before the process goes away.

use std::future::Future;
use tictac_server::ShutdownState;
use tokio::signal;
use tracing::info;

/// Waits for a termination signal (SIGINT or SIGTERM on Unix, Ctrl+C on
/// Windows), then initiates `shutdown_state` so the accept loops stop.
pub async fn setup_signal_handlers(
    shutdown_state: &ShutdownState,
) -> Result<(), Box<dyn std::error::Error>> {
    initiate_on(wait_for_signal(), shutdown_state).await
}

async fn initiate_on<F>(
    received: F,
    shutdown_state: &ShutdownState,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = std::io::Result<()>>,
{
    received.await?;
    info!("📡 Received shutdown signal - initiating graceful shutdown");
    shutdown_state.initiate_shutdown();
    Ok(())
}

/// Resolves on the next termination signal.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<()> {
    use signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => (),
        _ = sigterm.recv() => ()
    }
    Ok(())
}

/// Resolves on the next Ctrl+C.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<()> {
    signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn test_signal_initiates_the_servers_shutdown_state() {
        let shutdown_state = ShutdownState::new();
        let accept_loop_view = shutdown_state.clone();

        initiate_on(async { Ok(()) }, &shutdown_state)
            .await
            .expect("signal received");
        assert!(accept_loop_view.is_shutdown_initiated());
    }

    #[tokio::test]
    async fn test_failed_signal_setup_leaves_the_server_running() {
        let shutdown_state = ShutdownState::new();
        let result = initiate_on(
            async { Err(io::Error::new(io::ErrorKind::Other, "no signal driver")) },
            &shutdown_state,
        )
        .await;
        assert!(result.is_err());
        assert!(!shutdown_state.is_shutdown_initiated());
    }
}
