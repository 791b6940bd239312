//! OCPP CSMS Binary
//!
//! Command-line interface for running the OCPP central system

use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use ocpp_csms::config::{self, Config};
use ocpp_csms::{utils, Csms};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let matches = Command::new("csms")
        .version(env!("CARGO_PKG_VERSION"))
        .about("OCPP 1.6-J Central System")
        .subcommand(
            Command::new("start")
                .about("Start the CSMS server")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Configuration file path"),
                )
                .arg(
                    Arg::new("ws-port")
                        .long("ws-port")
                        .value_name("PORT")
                        .help("Charge point WebSocket port")
                        .value_parser(value_parser!(u16)),
                )
                .arg(
                    Arg::new("http-port")
                        .long("http-port")
                        .value_name("PORT")
                        .help("HTTP control plane port")
                        .value_parser(value_parser!(u16)),
                )
                .arg(
                    Arg::new("log-level")
                        .short('l')
                        .long("log-level")
                        .value_name("LEVEL")
                        .help("Log level (trace, debug, info, warn, error)"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate a configuration file")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .required(true)
                        .help("Configuration file path"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("start", sub_matches)) => start(sub_matches).await,
        Some(("check-config", sub_matches)) => check_config(sub_matches),
        _ => {
            eprintln!("No subcommand provided. Use --help for usage information.");
            process::exit(1);
        }
    }
}

async fn start(matches: &ArgMatches) {
    let config = match resolve_config(matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            process::exit(1);
        }
    };

    if let Err(e) = utils::init_tracing(&config.logging.level) {
        eprintln!("{}", e);
        process::exit(1);
    }

    let mut csms = match Csms::new(config) {
        Ok(csms) => csms,
        Err(e) => {
            error!("Failed to create CSMS: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = csms.start() {
        error!("Failed to start CSMS: {}", e);
        process::exit(1);
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, stopping CSMS...");
            if let Err(e) = csms.stop().await {
                error!("Error during shutdown: {}", e);
                process::exit(1);
            }
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
            process::exit(1);
        }
    }

    info!("CSMS shutdown complete");
}

/// File (or defaults), then environment, then command-line flags
fn resolve_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => config::load_from_file(path).with_context(|| format!("reading {}", path))?,
        None => Config::default(),
    };
    config::apply_env(&mut config);

    if let Some(port) = matches.get_one::<u16>("ws-port") {
        config.server.websocket_port = *port;
    }
    if let Some(port) = matches.get_one::<u16>("http-port") {
        config.server.http_port = *port;
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    config::validate_config(&config).map_err(anyhow::Error::msg)?;
    Ok(config)
}

fn check_config(matches: &ArgMatches) {
    let Some(path) = matches.get_one::<String>("config") else {
        eprintln!("--config is required");
        process::exit(1);
    };
    let result = config::load_from_file(path)
        .map_err(|e| e.to_string())
        .and_then(|config| config::validate_config(&config));
    match result {
        Ok(()) => println!("{}: configuration is valid", path),
        Err(e) => {
            eprintln!("{}: {}", path, e);
            process::exit(1);
        }
    }
}
