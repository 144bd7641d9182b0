//! Configuration management for the tic-tac-toe server.
//!
//! This module handles loading, validation, and conversion of server configuration
//! from TOML files and command-line arguments.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tictac_server::{RejectionMode, ServerConfig};
use tracing::info;

fn default_max_connections() -> usize {
    1000
}

fn default_acceptors() -> usize {
    1
}

fn default_max_message_size() -> usize {
    1024
}

fn default_outbox_capacity() -> usize {
    64
}

fn default_shutdown_grace_ms() -> u64 {
    3000
}

fn default_close_room_on_leave() -> bool {
    true
}

/// Application configuration loaded from TOML file.
///
/// This is the main configuration structure that encompasses all server
/// settings: networking, game policy and logging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Game policy settings
    #[serde(default)]
    pub game: GameSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
///
/// Controls network binding, connection limits and framing limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:9001")
    pub bind_address: String,
    /// Maximum number of concurrent client connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Accept loops sharing the listener (0 = one per CPU core)
    #[serde(default = "default_acceptors")]
    pub acceptors: usize,
    /// Maximum length in bytes of one inbound line
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Outbound messages queued per client before new ones are dropped
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
    /// How long shutdown waits for clients to receive `exit`, in milliseconds
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9001".to_string(),
            max_connections: default_max_connections(),
            acceptors: default_acceptors(),
            max_message_size: default_max_message_size(),
            outbox_capacity: default_outbox_capacity(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

/// Game policy shared by every room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    /// `notify` echoes `error <reason>` for rejected moves, `silent` drops them
    #[serde(default)]
    pub rejection_mode: RejectionMode,
    /// Send `exit` to the remaining player when the other one leaves
    #[serde(default = "default_close_room_on_leave")]
    pub close_room_on_leave: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            rejection_mode: RejectionMode::Notify,
            close_room_on_leave: default_close_room_on_leave(),
        }
    }
}

/// Logging system configuration.
///
/// Controls log output format and level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, or an error if loading/creation failed.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Create default config file
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the application configuration to the room server configuration.
    ///
    /// # Returns
    ///
    /// A `ServerConfig` instance ready for use with the server, or an error
    /// if the bind address does not parse.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            max_connections: self.server.max_connections,
            acceptors: self.server.acceptors,
            max_message_size: self.server.max_message_size,
            outbox_capacity: self.server.outbox_capacity,
            rejection_mode: self.game.rejection_mode,
            close_room_on_leave: self.game.close_room_on_leave,
            shutdown_grace_ms: self.server.shutdown_grace_ms,
        })
    }

    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        // Validate bind address
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }

        if self.server.max_connections == 0 {
            return Err("server.max_connections must be greater than 0".to_string());
        }

        if self.server.max_message_size == 0 {
            return Err("server.max_message_size must be greater than 0".to_string());
        }

        if self.server.outbox_capacity == 0 {
            return Err("server.outbox_capacity must be greater than 0".to_string());
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
