//! Neo4j MCP Bridge
//!
//! Exposes a Neo4j server's HTTP transactional endpoint to MCP hosts as three
//! tools: run an arbitrary Cypher query, create a labeled node, and create a
//! typed relationship between two existing nodes.
//!
//! # Architecture
//!
//! - **Config**: connection descriptor layered from defaults, file and environment
//! - **Client**: request encoding, response parsing, one-shot compatibility rewrite
//! - **Entity**: templated create operations normalized to `{row, meta}`
//! - **MCP**: JSON-RPC 2.0 stdio server and the tool boundary with deadlines
//!
//! # Example
//!
//! ```ignore
//! use neo4j_mcp::{Neo4jClient, Neo4jConfig, QueryExecutor, Params};
//!
//! #[tokio::main]
//! async fn main() -> neo4j_mcp::Result<()> {
//!     let config = Neo4jConfig::load(None)?;
//!     let client = Neo4jClient::new(&config)?;
//!
//!     let rows = client
//!         .execute("MATCH (n:Person) RETURN n.name AS name", &Params::new())
//!         .await?;
//!     println!("{} people", rows.len());
//!
//!     client.close();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod identifier;
pub mod mcp;
pub mod types;

// Re-export commonly used types
pub use client::{Neo4jClient, QueryExecutor, QueryResult, Record};
pub use config::Neo4jConfig;
pub use entity::EntityOperations;
pub use error::{BridgeError, Result};
pub use mcp::{McpServer, ToolHandler};
pub use types::{EntityResult, Params, QueryRequest, RowMapping};
