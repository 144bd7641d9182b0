//! Core room server implementation.
//!
//! This module contains the main `GameServer` struct: it owns the session
//! registry and connection manager, runs the accept loops and coordinates
//! shutdown.

use crate::{
    config::ServerConfig,
    connection::ConnectionManager,
    error::ServerError,
    game::{RegistryStats, RoomPolicy, SessionRegistry},
    server::handlers::handle_connection,
    shutdown::ShutdownState,
};
use futures::stream::{FuturesUnordered, StreamExt as FuturesStreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};
use tracing::{error, info, trace, warn};

/// The core room server structure.
///
/// `GameServer` ties the networking to the game: every accepted socket gets
/// its own task, which the [`SessionRegistry`] seats in a room.
///
/// # Architecture
///
/// * **Session Registry**: room allocation, seating and teardown
/// * **Connection Management**: participant ids and the connection limit
/// * **Multi-acceptor Networking**: several accept loops share one listener
pub struct GameServer {
    /// Server configuration settings
    config: Arc<ServerConfig>,

    /// Registry of every live room
    registry: Arc<SessionRegistry>,

    /// Manager for client connections
    connection_manager: Arc<ConnectionManager>,

    /// Channel for stopping the accept loops from inside the process
    shutdown_sender: broadcast::Sender<()>,
}

impl GameServer {
    /// Creates a new room server with the specified configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration parameters for server behavior
    ///
    /// # Returns
    ///
    /// A new `GameServer` instance ready to be started.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new(RoomPolicy::from(&config)));
        let connection_manager = Arc::new(ConnectionManager::new(config.max_connections));
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            config: Arc::new(config),
            registry,
            connection_manager,
            shutdown_sender,
        }
    }

    /// Binds the configured address and serves until shutdown is initiated
    /// through `shutdown_state` or [`GameServer::shutdown`].
    ///
    /// # Returns
    ///
    /// `Ok(())` once the accept loops have stopped, or a `ServerError` if
    /// the address could not be bound.
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, Some(shutdown_state)).await
    }

    /// Binds the configured address and serves until [`GameServer::shutdown`].
    pub async fn start(&self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, None).await
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.bind_address;
        TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Network(format!("Failed to bind {addr}: {e}")))
    }

    /// Runs the accept loops on an already bound listener.
    ///
    /// `acceptors` loops share the listener; each spawns one task per
    /// accepted connection. Returns once every loop has stopped.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown_state: Option<ShutdownState>,
    ) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Listener has no local address: {e}")))?;
        let num_acceptors = self.config.acceptor_count();
        info!("🚀 Tic-tac-toe server listening on {}", local_addr);
        info!("🧠 Using {} acceptor(s)", num_acceptors);

        let listener = Arc::new(listener);
        let mut accept_futures = (0..num_acceptors)
            .map(|index| {
                let listener = Arc::clone(&listener);
                let config = Arc::clone(&self.config);
                let registry = Arc::clone(&self.registry);
                let connection_manager = Arc::clone(&self.connection_manager);
                let shutdown_state = shutdown_state.clone();
                let shutdown_receiver = self.shutdown_sender.subscribe();

                async move {
                    let stop = stop_requested(shutdown_state, shutdown_receiver);
                    tokio::pin!(stop);
                    loop {
                        tokio::select! {
                            _ = &mut stop => {
                                info!("🛑 Accept loop {} stopping - shutdown initiated", index);
                                break;
                            }
                            accepted = listener.accept() => {
                                match accepted {
                                    Ok((stream, addr)) => {
                                        trace!("Acceptor {} accepted {}", index, addr);
                                        spawn_connection(
                                            stream,
                                            addr,
                                            Arc::clone(&config),
                                            Arc::clone(&connection_manager),
                                            Arc::clone(&registry),
                                        );
                                    }
                                    Err(e) => {
                                        warn!("Failed to accept connection: {}", e);
                                        sleep(Duration::from_millis(100)).await;
                                    }
                                }
                            }
                        }
                    }
                }
            })
            .collect::<FuturesUnordered<_>>();

        while accept_futures.next().await.is_some() {}

        info!("Server stopped accepting connections");
        Ok(())
    }

    /// Stops the accept loops and sends `exit` to every seated client.
    ///
    /// # Returns
    ///
    /// The number of clients that were told to exit.
    pub async fn shutdown(&self) -> usize {
        // No receivers simply means nothing is serving.
        let _ = self.shutdown_sender.send(());
        self.registry.shutdown().await
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of connections currently being handled.
    pub async fn active_connections(&self) -> usize {
        self.connection_manager.active_count().await
    }

    /// Room counters from the registry.
    pub async fn stats(&self) -> RegistryStats {
        self.registry.stats().await
    }
}

fn spawn_connection(
    stream: tokio::net::TcpStream,
    addr: SocketAddr,
    config: Arc<ServerConfig>,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<SessionRegistry>,
) {
    tokio::spawn(async move {
        let result = handle_connection(stream, addr, config, connection_manager, registry).await;
        if let Err(e) = result {
            error!("Connection error: {:?}", e);
        }
    });
}

/// Resolves when either the application or [`GameServer::shutdown`] asks the
/// accept loops to stop.
async fn stop_requested(
    shutdown_state: Option<ShutdownState>,
    mut shutdown_receiver: broadcast::Receiver<()>,
) {
    match shutdown_state {
        Some(state) => {
            tokio::select! {
                _ = state.wait_for_shutdown() => {}
                _ = shutdown_receiver.recv() => {}
            }
        }
        None => {
            let _ = shutdown_receiver.recv().await;
        }
    }
}
