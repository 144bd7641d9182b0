//! Logging system setup and the startup banner.
//!
//! Logs go through `tracing-subscriber`, either human-readable or as JSON
//! lines. Unless `RUST_LOG` says otherwise, the configured level applies to
//! the server crates and everything else is held at `warn`.

use crate::config::{AppConfig, LoggingSettings};
use tictac_server::RejectionMode;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events follow the configured level.
const SERVER_TARGETS: [&str; 3] = ["tictac_server", "lib_tictac", "tictac"];

/// Initializes the global subscriber.
///
/// # Arguments
///
/// * `config` - Logging configuration from the config file
/// * `json_format` - Whether to force JSON output format (CLI override)
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn setup_logging(
    config: &LoggingSettings,
    json_format: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let directives = default_directives(&config.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));
    let json = json_format || config.json_format;

    // Exactly one of the two layers is present.
    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_thread_ids(true)
            .with_thread_names(true)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_ansi(true)
            .with_thread_ids(true)
            .with_thread_names(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    let output = if json { "json" } else { "text" };
    info!(output, "🔧 Logging initialized with filter: {}", directives);
    Ok(())
}

/// Filter directives used when `RUST_LOG` is not set.
fn default_directives(level: &str) -> String {
    let mut directives = String::from("warn");
    for target in SERVER_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Displays the startup banner through the logger.
pub fn display_banner(config: &AppConfig) {
    for line in banner_lines(config) {
        info!("{}", line);
    }
}

fn banner_lines(config: &AppConfig) -> Vec<String> {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    let rejections = match config.game.rejection_mode {
        RejectionMode::Notify => "reported",
        RejectionMode::Silent => "silent",
    };
    let on_leave = if config.game.close_room_on_leave {
        "room closes"
    } else {
        "opponent stays"
    };

    let rows = [
        format!("❌ TIC-TAC-TOE SERVER ⭕  v{version}"),
        String::new(),
        format!("Listening on {}", config.server.bind_address),
        format!("Up to {} players", config.server.max_connections),
        format!("Rejected moves: {rejections}"),
        format!("Player leaves: {on_leave}"),
    ];

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("╔{}╗", "═".repeat(44)));
    lines.extend(rows.iter().map(|row| format!("║ {row:<42} ║")));
    lines.push(format!("╚{}╝", "═".repeat(44)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_applies_to_server_crates_only() {
        assert_eq!(
            default_directives("debug"),
            "warn,tictac_server=debug,lib_tictac=debug,tictac=debug"
        );
        assert!(EnvFilter::try_new(default_directives("trace")).is_ok());
    }

    #[test]
    fn test_banner_shows_listener_and_game_policy() {
        let mut config = AppConfig::default();
        config.server.bind_address = "0.0.0.0:7777".to_string();
        config.game.rejection_mode = RejectionMode::Silent;
        config.game.close_room_on_leave = false;

        let banner = banner_lines(&config).join("\n");
        assert!(banner.contains("Listening on 0.0.0.0:7777"));
        assert!(banner.contains("Rejected moves: silent"));
        assert!(banner.contains("Player leaves: opponent stays"));
        assert!(banner.contains("Up to 1000 players"));
    }
}
