//! Error types for the Neo4j MCP bridge
//!
//! This module provides the error taxonomy shared by the query executor,
//! entity operations and the tool boundary, using thiserror for structured
//! error definitions. Errors cross layers unchanged so the host sees the
//! original message.

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Network, connection or malformed-body failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Structured error reported by the database inside a well-formed envelope
    #[error("{message}")]
    Database {
        /// Message of the first reported error
        message: String,

        /// Neo4j status code, e.g. `Neo.ClientError.Statement.SyntaxError`
        code: Option<String>,
    },

    /// Tool-level deadline exceeded
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Tool that was cancelled
        operation: String,

        /// Deadline that elapsed
        seconds: u64,
    },

    /// A create operation returned no rows
    #[error("Entity creation failed: {0}")]
    EntityCreation(String),

    /// Label or relationship type outside the safe identifier grammar
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Tool arguments that do not match the tool's schema
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Stable, machine-readable category for the host
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Transport(_) => "transport",
            BridgeError::Database { .. } => "database",
            BridgeError::Timeout { .. } => "timeout",
            BridgeError::EntityCreation(_) => "entity_creation",
            BridgeError::InvalidIdentifier(_) => "invalid_identifier",
            BridgeError::InvalidParams(_) => "invalid_params",
            BridgeError::Config(_) => "config",
            BridgeError::Io(_) => "io",
            BridgeError::Serialization(_) => "serialization",
        }
    }

    /// JSON-RPC error code used when this error reaches the host
    pub fn rpc_code(&self) -> i32 {
        match self {
            BridgeError::Transport(_) => -32001,
            BridgeError::Database { .. } => -32002,
            BridgeError::Timeout { .. } => -32003,
            BridgeError::EntityCreation(_) => -32004,
            BridgeError::InvalidIdentifier(_) | BridgeError::InvalidParams(_) => -32602,
            _ => -32603,
        }
    }

    /// Build a database error without a status code
    pub fn database(message: impl Into<String>) -> Self {
        BridgeError::Database {
            message: message.into(),
            code: None,
        }
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::EntityCreation("no rows returned".to_string());
        assert_eq!(err.to_string(), "Entity creation failed: no rows returned");

        let err = BridgeError::Timeout {
            operation: "execute_query".to_string(),
            seconds: 30,
        };
        assert_eq!(err.to_string(), "execute_query timed out after 30s");
    }

    #[test]
    fn test_database_message_is_untouched() {
        let err = BridgeError::Database {
            message: "Invalid input 'X'".to_string(),
            code: Some("Neo.ClientError.Statement.SyntaxError".to_string()),
        };
        assert_eq!(err.to_string(), "Invalid input 'X'");
        assert_eq!(err.kind(), "database");
    }

    #[test]
    fn test_timeout_is_distinct_from_database() {
        let timeout = BridgeError::Timeout {
            operation: "execute_query".to_string(),
            seconds: 30,
        };
        let db = BridgeError::database("boom");
        assert_ne!(timeout.kind(), db.kind());
        assert_ne!(timeout.rpc_code(), db.rpc_code());
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: BridgeError = json_err.into();
        assert!(matches!(err, BridgeError::Serialization(_)));
        assert_eq!(err.rpc_code(), -32603);
    }
}
