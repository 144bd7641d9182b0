//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize the room server behavior.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// How a rejected move is reported back to the client that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionMode {
    /// Send `error <reason>` to the mover
    #[default]
    Notify,
    /// Drop the move without telling anyone (legacy clients)
    Silent,
}

/// Configuration structure for the room server.
///
/// Contains the network settings, connection limits and the game policies
/// every room is created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Number of accept loops sharing the listener (0 = one per CPU core)
    pub acceptors: usize,

    /// Maximum length in bytes of a single inbound line
    pub max_message_size: usize,

    /// Outbound messages queued per participant before new ones are dropped
    pub outbox_capacity: usize,

    /// Whether rejected moves are echoed to the mover
    pub rejection_mode: RejectionMode,

    /// Send `exit` to the remaining participant when the other one leaves
    pub close_room_on_leave: bool,

    /// How long shutdown waits for connections to flush `exit` and close
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 9001)),
            max_connections: 1000,
            acceptors: 1,
            max_message_size: 1024,
            outbox_capacity: 64,
            rejection_mode: RejectionMode::Notify,
            close_room_on_leave: true,
            shutdown_grace_ms: 3000,
        }
    }
}

impl ServerConfig {
    /// Number of accept loops to run, resolving `0` to the core count.
    pub fn acceptor_count(&self) -> usize {
        if self.acceptors == 0 {
            num_cpus::get().max(1)
        } else {
            self.acceptors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_server() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:9001");
        assert_eq!(config.rejection_mode, RejectionMode::Notify);
        assert!(config.close_room_on_leave);
        assert_eq!(config.acceptor_count(), 1);
    }

    #[test]
    fn zero_acceptors_means_one_per_core() {
        let config = ServerConfig {
            acceptors: 0,
            ..Default::default()
        };
        assert!(config.acceptor_count() >= 1);
    }
}
