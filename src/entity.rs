//! Node and relationship creation
//!
//! Thin wrappers that template parameterized Cypher, delegate to a
//! [`QueryExecutor`] and normalize the first returned row into an
//! [`EntityResult`].

use crate::client::QueryExecutor;
use crate::error::{BridgeError, Result};
use crate::identifier;
use crate::types::{EntityResult, QueryRequest, RowMapping};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Creates labeled nodes and typed relationships
#[derive(Clone)]
pub struct EntityOperations {
    executor: Arc<dyn QueryExecutor>,
}

impl EntityOperations {
    /// Create entity operations on top of an executor
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Create a node with one label and the given properties.
    ///
    /// Returns `row` = node properties, `meta` = `{id, labels}`.
    pub async fn create_node(&self, label: &str, properties: Map<String, Value>) -> Result<EntityResult> {
        info!("Creating node with label {}", label);
        let logged = Value::Object(properties.clone());
        debug!("Node properties: {}", logged);

        let request = QueryRequest::new(format!(
            "CREATE (n:{} $props) RETURN n, id(n) AS id, labels(n) AS labels",
            identifier::quoted("label", label)?
        ))
        .param("props", properties);

        let result = self
            .executor
            .execute(&request.statement, &request.parameters)
            .await
            .and_then(|rows| {
                first_entity(rows, "n", &["id", "labels"], || {
                    format!("no rows returned creating node with label {}", label)
                })
            });

        match &result {
            Ok(entity) => info!("Created node {:?} with label {}", entity.id(), label),
            Err(e) => error!("Node creation failed: {}", e),
        }
        result
    }

    /// Create a directed relationship `(from)-[:rel_type]->(to)` between existing nodes.
    ///
    /// Missing properties default to an empty map. Returns `row` =
    /// relationship properties, `meta` = `{id, type, start, end}`.
    pub async fn create_relationship(
        &self,
        from_id: i64,
        to_id: i64,
        rel_type: &str,
        properties: Option<Map<String, Value>>,
    ) -> Result<EntityResult> {
        info!(
            "Creating relationship {} from node {} to node {}",
            rel_type, from_id, to_id
        );

        let request = QueryRequest::new(format!(
            "MATCH (from), (to) WHERE id(from) = $from_id AND id(to) = $to_id \
             CREATE (from)-[r:{}]->(to) \
             SET r = $props \
             RETURN r, id(r) AS id, type(r) AS type",
            identifier::quoted("relationship type", rel_type)?
        ))
        .param("from_id", from_id)
        .param("to_id", to_id)
        .param("props", properties.unwrap_or_default());

        let result = self
            .executor
            .execute(&request.statement, &request.parameters)
            .await
            .and_then(|rows| {
                first_entity(rows, "r", &["id", "type"], || {
                    format!(
                        "no rows returned creating {} relationship; node {} or {} does not exist",
                        rel_type, from_id, to_id
                    )
                })
            })
            .map(|mut entity| {
                entity.meta.insert("start".to_string(), Value::from(from_id));
                entity.meta.insert("end".to_string(), Value::from(to_id));
                entity
            });

        match &result {
            Ok(entity) => info!("Created relationship {:?}", entity.id()),
            Err(e) => error!("Relationship creation failed: {}", e),
        }
        result
    }
}

/// Split the first row into the entity's properties and its metadata columns
fn first_entity<F>(
    rows: Vec<RowMapping>,
    entity_column: &str,
    meta_columns: &[&str],
    empty_message: F,
) -> Result<EntityResult>
where
    F: FnOnce() -> String,
{
    let mut first = rows
        .into_iter()
        .next()
        .ok_or_else(|| BridgeError::EntityCreation(empty_message()))?;

    let row = match first.remove(entity_column) {
        Some(Value::Object(properties)) => properties,
        Some(Value::Null) | None => Map::new(),
        Some(other) => {
            return Err(BridgeError::Transport(format!(
                "Unexpected value for column '{}': {}",
                entity_column, other
            )))
        }
    };

    let meta = meta_columns
        .iter()
        .filter_map(|column| first.remove(*column).map(|v| (column.to_string(), v)))
        .collect();

    Ok(EntityResult { row, meta })
}
