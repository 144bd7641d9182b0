//! Utility functions and helper methods for the room server.
//!
//! This module provides convenient factory functions for creating server
//! instances with different configurations.

use crate::{config::ServerConfig, server::GameServer};

/// Creates a new room server with default configuration.
///
/// The default binds `127.0.0.1:9001`.
///
/// # Example
///
/// ```rust
/// use tictac_server::create_server;
///
/// let server = create_server();
/// assert_eq!(server.config().bind_address.port(), 9001);
/// ```
pub fn create_server() -> GameServer {
    GameServer::new(ServerConfig::default())
}

/// Creates a new room server with custom configuration.
///
/// # Arguments
///
/// * `config` - A `ServerConfig` instance with desired settings
///
/// # Example
///
/// ```rust
/// use tictac_server::{create_server_with_config, RejectionMode, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "0.0.0.0:9000".parse().expect("valid address"),
///     rejection_mode: RejectionMode::Silent,
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config);
/// assert_eq!(server.config().rejection_mode, RejectionMode::Silent);
/// ```
pub fn create_server_with_config(config: ServerConfig) -> GameServer {
    GameServer::new(config)
}
