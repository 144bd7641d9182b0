//! Command-line interface handling for the tic-tac-toe server.
//!
//! This module provides command-line argument parsing using the `clap` crate.

use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// This structure holds all the command-line options that can be used to
/// override configuration file settings.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for bind address
    pub bind_address: Option<String>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional override for the number of accept loops
    pub acceptors: Option<usize>,
    /// Whether to drop rejected moves without telling the client
    pub silent_rejections: bool,
}

impl CliArgs {
    /// Parses the process arguments.
    ///
    /// Exits with a usage message if the arguments are invalid, like any
    /// clap-based binary.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list (the first item is the binary name).
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config.toml")),
            bind_address: matches.get_one::<String>("bind").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            acceptors: matches.get_one::<usize>("acceptors").copied(),
            silent_rejections: matches.get_flag("silent-rejections"),
        }
    }
}

fn command() -> Command {
    Command::new("Tic-tac-toe Room Server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pairs TCP clients into two-player tic-tac-toe rooms")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDRESS")
                .help("Bind address (e.g., 127.0.0.1:9001)"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("acceptors")
                .long("acceptors")
                .value_name("N")
                .help("Number of accept loops (0 = one per CPU core)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("silent-rejections")
                .long("silent-rejections")
                .help("Ignore invalid moves without replying (legacy client behaviour)")
                .action(clap::ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["tictac"]).expect("parses");
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
        assert_eq!(args.bind_address, None);
        assert_eq!(args.acceptors, None);
        assert!(!args.json_logs);
        assert!(!args.silent_rejections);
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::try_parse_from([
            "tictac",
            "-c",
            "prod.toml",
            "--bind",
            "0.0.0.0:9001",
            "-l",
            "debug",
            "--json-logs",
            "--acceptors",
            "4",
            "--silent-rejections",
        ])
        .expect("parses");

        assert_eq!(args.config_path, PathBuf::from("prod.toml"));
        assert_eq!(args.bind_address.as_deref(), Some("0.0.0.0:9001"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert_eq!(args.acceptors, Some(4));
        assert!(args.silent_rejections);
    }

    #[test]
    fn test_rejects_non_numeric_acceptors() {
        assert!(CliArgs::try_parse_from(["tictac", "--acceptors", "many"]).is_err());
    }
}
