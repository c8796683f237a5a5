//! neo4j-mcp - MCP server for Neo4j
//!
//! Serves the `execute_query`, `create_node` and `create_relationship` tools
//! over stdio, backed by the Neo4j HTTP transaction endpoint.
//!
//! Usage:
//!   neo4j-mcp [OPTIONS]
//!
//! Examples:
//!   neo4j-mcp                                   # Configure from environment / neo4j-mcp.toml
//!   neo4j-mcp --uri https://db.example.com:7473 # Override the server address
//!   neo4j-mcp --config /etc/neo4j-mcp.toml --log-level debug

use anyhow::{Context, Result};
use clap::Parser;
use neo4j_mcp::{McpServer, Neo4jClient, Neo4jConfig, ToolHandler};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

/// neo4j-mcp command-line arguments
#[derive(Parser)]
#[command(name = "neo4j-mcp")]
#[command(about = "MCP server exposing Neo4j query and entity-creation tools")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); defaults to ./neo4j-mcp.toml when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Neo4j HTTP(S) URI (overrides NEO4J_URI)
    #[arg(long)]
    uri: Option<String>,

    /// Neo4j username (overrides NEO4J_USERNAME)
    #[arg(long)]
    username: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = cli.log_level.parse::<Level>().unwrap_or(Level::INFO);

    // RUST_LOG wins when set; otherwise keep HTTP internals quiet
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "neo4j_mcp={},reqwest=warn,hyper=warn",
            level.as_str().to_lowercase()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries JSON-RPC
        .init();

    debug!("neo4j-mcp v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli).await {
        error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).context("Failed to load configuration")?;
    info!("Connecting to {}", config.uri);

    let client =
        Arc::new(Neo4jClient::new(&config).context("Failed to initialize Neo4j client")?);

    let tool_handler = ToolHandler::new(client.clone(), config.query_timeout);
    let server = McpServer::new(tool_handler);

    // Run server with graceful shutdown on signals
    let result = tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping MCP server gracefully...");
            Ok(())
        }
    };

    client.close();
    info!("MCP server shut down complete");

    result.context("MCP server failed")
}

fn load_config(cli: &Cli) -> neo4j_mcp::Result<Neo4jConfig> {
    let uri = cli.uri.clone();
    let username = cli.username.clone();

    Neo4jConfig::load_with(cli.config.as_deref(), move |key| match key {
        "NEO4J_URI" if uri.is_some() => uri.clone(),
        "NEO4J_USERNAME" if username.is_some() => username.clone(),
        _ => std::env::var(key).ok(),
    })
}
