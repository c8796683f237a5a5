//! Core data types for the Neo4j MCP bridge
//!
//! JSON-shaped payloads use `serde_json::Value`, a tagged union over null,
//! bool, number, string, ordered sequence and ordered mapping. With the
//! `preserve_order` feature, mappings keep insertion order, so result rows
//! keep the column declaration order reported by the database.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named query parameters, bound by the database and never interpolated
pub type Params = Map<String, Value>;

/// One result row: column name to value, in column declaration order
pub type RowMapping = Map<String, Value>;

/// A single statement to submit to the transaction endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Cypher statement text
    pub statement: String,

    /// Parameters referenced as `$name` in the statement
    #[serde(default)]
    pub parameters: Params,
}

impl QueryRequest {
    /// Create a request without parameters
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            parameters: Params::new(),
        }
    }

    /// Add a named parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Normalized outcome of a create operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResult {
    /// The entity's own properties
    pub row: Map<String, Value>,

    /// Identity and classification (internal id, labels or type)
    pub meta: Map<String, Value>,
}

impl EntityResult {
    /// Internal id reported in `meta`, if any
    pub fn id(&self) -> Option<i64> {
        self.meta.get("id").and_then(Value::as_i64)
    }
}
