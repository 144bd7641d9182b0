//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates server
//! startup, periodic statistics and the phased graceful shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{setup_signal_handlers, wait_for_signal},
};
use std::sync::Arc;
use tictac_server::{GameServer, RejectionMode, ShutdownState};
use tokio::time::{interval, sleep, timeout, Duration, Instant};
use tracing::{error, info, warn};

/// Main application struct.
///
/// The `Application` struct manages the complete lifecycle of the server:
/// configuration, the server task, statistics and graceful shutdown.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Room server instance
    server: Arc<GameServer>,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Initialize the room server
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        apply_cli_overrides(&mut config, &args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        display_banner(&config);

        let server_config = config.to_server_config()?;
        let server = Arc::new(GameServer::new(server_config));

        info!("📂 Config: {}", args.config_path.display());

        Ok(Self { config, server })
    }

    /// Runs the server until a shutdown signal, then shuts down in phases.
    ///
    /// # Shutdown Phases
    ///
    /// 1. Stop the accept loops
    /// 2. Send `exit` to every seated client and close all rooms
    /// 3. Wait up to `shutdown_grace_ms` for connections to drain
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting tic-tac-toe server application");
        self.log_configuration_summary();

        let shutdown_state = ShutdownState::new();

        // Start server in background
        let server_handle = {
            let server = Arc::clone(&self.server);
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state).await {
                    Ok(()) => {
                        info!("✅ Server completed successfully");
                    }
                    Err(e) => {
                        error!("❌ Server error: {:?}", e);
                        std::process::exit(1);
                    }
                }
            })
        };

        // Periodic room statistics
        let monitoring_handle = {
            let server = Arc::clone(&self.server);
            tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(60));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let stats = server.stats().await;
                    info!(
                        "📊 Rooms: {} active ({} waiting) | {} players | {} created",
                        stats.active_rooms,
                        stats.open_rooms,
                        stats.participants,
                        stats.rooms_created
                    );
                }
            })
        };

        info!("✅ Tic-tac-toe server is now running!");
        info!("🎮 Ready to accept connections on {}", self.config.server.bind_address);
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        setup_signal_handlers(&shutdown_state).await?;

        // A second signal skips the graceful path
        tokio::spawn(async move {
            if let Err(e) = wait_for_signal().await {
                error!("Failed to set up forced shutdown signal handler: {e}");
                return;
            }
            warn!("Shutdown signal received again, exiting immediately");
            std::process::exit(1);
        });

        monitoring_handle.abort();

        info!("📡 Phase 1: Stopping accept loops...");
        match timeout(Duration::from_secs(5), server_handle).await {
            Ok(_) => info!("✅ Accept loops stopped"),
            Err(_) => warn!("⏰ Accept loops did not stop in time, continuing shutdown"),
        }

        info!("🚪 Phase 2: Sending exit to every client...");
        let notified = self.server.shutdown().await;
        info!("📨 {} client(s) told to exit", notified);

        info!("⏳ Phase 3: Waiting for connections to close...");
        let grace = Duration::from_millis(self.config.server.shutdown_grace_ms);
        let deadline = Instant::now() + grace;
        loop {
            let remaining = self.server.active_connections().await;
            if remaining == 0 {
                info!("✅ All connections closed");
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    "⏰ {} connection(s) still open after {:?}, exiting anyway",
                    remaining, grace
                );
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }

        self.log_final_statistics().await;
        info!("👋 Tic-tac-toe server shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  🧠 Acceptors: {}", self.server.config().acceptor_count());
        info!("  📏 Max line length: {} bytes", self.config.server.max_message_size);
        info!(
            "  ⚖️ Rejected moves: {}",
            match self.config.game.rejection_mode {
                RejectionMode::Notify => "reported to the client",
                RejectionMode::Silent => "silently ignored",
            }
        );
    }

    /// Logs final statistics during shutdown.
    async fn log_final_statistics(&self) {
        let stats = self.server.stats().await;
        info!("📊 Final Statistics:");
        info!("  - Rooms created: {}", stats.rooms_created);
        info!("  - Rooms still registered: {}", stats.active_rooms);
    }
}

/// Applies command-line overrides on top of the file configuration.
pub(crate) fn apply_cli_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(bind_address) = &args.bind_address {
        config.server.bind_address = bind_address.clone();
    }

    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }

    if args.json_logs {
        config.logging.json_format = true;
    }

    if let Some(acceptors) = args.acceptors {
        config.server.acceptors = acceptors;
    }

    if args.silent_rejections {
        config.game.rejection_mode = RejectionMode::Silent;
    }
}
