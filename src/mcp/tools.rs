//! MCP tool implementations
//!
//! Exposes three tools backed by the query executor:
//! - `execute_query`: run arbitrary Cypher with named parameters
//! - `create_node`: create a labeled node
//! - `create_relationship`: connect two existing nodes
//!
//! Every tool call runs under the configured deadline. Errors are logged
//! where they are caught and returned unchanged.

use crate::client::QueryExecutor;
use crate::entity::EntityOperations;
use crate::error::{BridgeError, Result};
use crate::types::{Params, QueryRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (e.g., "execute_query")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Deserialize)]
struct ExecuteQueryParams {
    query: String,
    #[serde(default)]
    params: Option<Params>,
}

#[derive(Deserialize)]
struct CreateNodeParams {
    label: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Deserialize)]
struct CreateRelationshipParams {
    from_node_id: i64,
    to_node_id: i64,
    rel_type: String,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

/// Tool handler that dispatches host calls to the executor and entity operations
pub struct ToolHandler {
    executor: Arc<dyn QueryExecutor>,
    entities: EntityOperations,
    deadline: Duration,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(executor: Arc<dyn QueryExecutor>, deadline: Duration) -> Self {
        Self {
            entities: EntityOperations::new(executor.clone()),
            executor,
            deadline,
        }
    }

    /// Get list of all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "execute_query".to_string(),
                description: "Execute a Cypher query against Neo4j. Parameters are bound by name ($name); returns the result rows as objects keyed by column.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Cypher statement"
                        },
                        "params": {
                            "type": "object",
                            "description": "Named query parameters (optional)"
                        }
                    },
                    "required": ["query"]
                }),
            },
            Tool {
                name: "create_node".to_string(),
                description: "Create a node with a label and properties. Returns the node properties (row) and its id and labels (meta).".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "label": {
                            "type": "string",
                            "description": "Node label (letters, digits, underscore)"
                        },
                        "properties": {
                            "type": "object",
                            "description": "Node properties"
                        }
                    },
                    "required": ["label", "properties"]
                }),
            },
            Tool {
                name: "create_relationship".to_string(),
                description: "Create a directed relationship between two existing nodes identified by internal id.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "from_node_id": {
                            "type": "integer",
                            "description": "Internal id of the start node"
                        },
                        "to_node_id": {
                            "type": "integer",
                            "description": "Internal id of the end node"
                        },
                        "rel_type": {
                            "type": "string",
                            "description": "Relationship type (letters, digits, underscore)"
                        },
                        "properties": {
                            "type": "object",
                            "description": "Relationship properties (optional)"
                        }
                    },
                    "required": ["from_node_id", "to_node_id", "rel_type"]
                }),
            },
        ]
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_name: &str, params: Value) -> Result<Value> {
        debug!("Executing tool: {}", tool_name);

        let result = match tool_name {
            "execute_query" => self.execute_query(params).await,
            "create_node" => self.create_node(params).await,
            "create_relationship" => self.create_relationship(params).await,
            _ => {
                warn!("Unknown tool: {}", tool_name);
                Err(BridgeError::InvalidParams(format!("Unknown tool: {}", tool_name)))
            }
        };

        if let Err(e) = &result {
            error!("Tool {} failed ({}): {}", tool_name, e.kind(), e);
        }
        result
    }

    async fn execute_query(&self, params: Value) -> Result<Value> {
        let params: ExecuteQueryParams = parse_params(params)?;
        if params.query.trim().is_empty() {
            return Err(BridgeError::InvalidParams("query cannot be empty".to_string()));
        }

        let request = QueryRequest {
            statement: params.query,
            parameters: params.params.unwrap_or_default(),
        };

        info!("Executing query: {}", request.statement);
        if !request.parameters.is_empty() {
            let logged = Value::Object(request.parameters.clone());
            debug!("Query parameters: {}", logged);
        }

        let rows = self
            .with_deadline(
                "execute_query",
                self.executor.execute(&request.statement, &request.parameters),
            )
            .await?;

        info!("Query returned {} rows", rows.len());
        Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
    }

    async fn create_node(&self, params: Value) -> Result<Value> {
        let params: CreateNodeParams = parse_params(params)?;

        let entity = self
            .with_deadline(
                "create_node",
                self.entities.create_node(&params.label, params.properties),
            )
            .await?;

        info!("create_node returned {} properties", entity.row.len());
        Ok(serde_json::to_value(entity)?)
    }

    async fn create_relationship(&self, params: Value) -> Result<Value> {
        let params: CreateRelationshipParams = parse_params(params)?;

        let entity = self
            .with_deadline(
                "create_relationship",
                self.entities.create_relationship(
                    params.from_node_id,
                    params.to_node_id,
                    &params.rel_type,
                    params.properties,
                ),
            )
            .await?;

        info!("create_relationship returned {} properties", entity.row.len());
        Ok(serde_json::to_value(entity)?)
    }

    /// Cancel `operation` once the deadline elapses
    async fn with_deadline<T, F>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.deadline, future).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout {
                operation: operation.to_string(),
                seconds: self.deadline.as_secs(),
            }),
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T> {
    let params = if params.is_null() {
        Value::Object(Map::new())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| BridgeError::InvalidParams(e.to_string()))
}
