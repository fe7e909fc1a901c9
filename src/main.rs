use anyhow::Result;
use quiverdb::{engine::Engine, server::serve, shell};
use std::sync::Arc;
use clap::{Arg, Command};
use tracing_subscriber::{fmt, EnvFilter};

/// Main entry point for the quiverdb binary.
///
/// This function:
/// 1. Parses command-line arguments for data directory and addresses
/// 2. Initializes structured logging with tracing
/// 3. Either connects the interactive shell to a running server, or opens
///    the storage engine (scanning the data directory for databases) and
///    starts the TCP server
///
/// # Arguments
/// - `--data DIR`: Storage root, one subdirectory per database (default: data)
/// - `--listen ADDR`: TCP address to bind to (default: 127.0.0.1:65432)
/// - `--connect ADDR`: Run the interactive shell against a server instead
///
/// # Example Usage
/// ```bash
/// cargo run -- --data ./data --listen 127.0.0.1:65432
/// cargo run -- --connect 127.0.0.1:65432
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let matches = Command::new("quiverdb")
        .about("Tiny record store: arrow commands over TCP, one JSON document per database")
        .arg(Arg::new("data")
            .long("data")
            .value_name("DIR")
            .default_value("data")
            .help("Storage root, one subdirectory per database"))
        .arg(Arg::new("listen")
            .long("listen")
            .value_name("ADDR")
            .default_value("127.0.0.1:65432")
            .help("Listen address for the TCP server"))
        .arg(Arg::new("connect")
            .long("connect")
            .value_name("ADDR")
            .help("Run the interactive shell against a server at ADDR"))
        .get_matches();

    // Initialize structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Shell mode: no engine, just a client
    if let Some(addr) = matches.get_one::<String>("connect") {
        return shell::run(addr).await;
    }

    let data_dir = matches.get_one::<String>("data").expect("has default").to_string();
    let listen = matches.get_one::<String>("listen").expect("has default").to_string();

    // Open the storage engine (loads every persisted database)
    let engine = Arc::new(Engine::open(data_dir)?);

    // Start the TCP server
    serve(engine, &listen).await
}
