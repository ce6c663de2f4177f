//! Collibra Data Quality MCP Server
//!
//! This server exposes Collibra DQ API operations (SQL, rules, jobs, alerts)
//! as Model Context Protocol tools over stdio or streamable HTTP.

use std::env;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod server;
mod tools;

use dq_mcp_shared::{DqConfig, DqConnection, LoggingConfig};
use server::DqMcpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    // Check for --init flag
    if args.contains(&"--init".to_string()) {
        return init_config(&args);
    }

    let config_path = args.get(1).map(|s| s.as_str());

    // Load configuration, failing fast on missing settings
    let config = match DqConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            eprintln!(
                "Set DQ_URL, DQ_USERNAME, DQ_PASSWORD and DQ_ISS, or run `{} --init` to create a configuration file.",
                args[0]
            );
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    info!("Starting Collibra DQ MCP Server");
    info!("Configuration loaded successfully");

    // Create and run the MCP server
    let server = DqMcpServer::new(&config)?;

    info!("DQ MCP Server initialized, starting main loop");

    match server.run().await {
        Ok(_) => {
            info!("DQ MCP Server shut down gracefully");
            Ok(())
        }
        Err(e) => {
            error!("DQ MCP Server error: {}", e);
            Err(e.into())
        }
    }
}

/// Log to stderr; stdout carries the MCP stream. `RUST_LOG` overrides the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let result = if logging.format == "json" {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if let Err(e) = result {
        eprintln!("Failed to set global logging subscriber: {}", e);
    }
}

fn init_config(args: &[String]) -> anyhow::Result<()> {
    // Find the config path, skipping the --init flag
    let config_path: &str = if args.len() > 2 && args[1] == "--init" {
        &args[2]
    } else if args.len() > 2 && args[2] == "--init" {
        &args[1]
    } else {
        "config.json"
    };

    // Check if config already exists
    if std::path::Path::new(config_path).exists() {
        eprintln!("Configuration file '{}' already exists.", config_path);
        eprintln!("Remove it first if you want to create a new one.");
        std::process::exit(1);
    }

    let config = DqConfig {
        connection: DqConnection {
            base_url: "https://localhost:9000".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            issuer: "public".to_string(),
        },
        ..DqConfig::default()
    };

    match config.save(config_path) {
        Ok(_) => {
            println!(
                "✅ Configuration file '{}' created successfully!",
                config_path
            );
            println!();
            println!("Fill in the DQ password (or set DQ_PASSWORD) before starting.");
            println!("Any DQ_* environment variable overrides the file.");
            println!("Set transport.mode to \"http\" (or DQ_TRANSPORT=http) to serve streamable HTTP.");
            println!();
            println!("To start the MCP server:");
            println!("  {} {}", args[0], config_path);
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to create configuration file: {}", e);
            std::process::exit(1);
        }
    }
}
