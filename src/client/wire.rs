//! Wire format of the HTTP transaction endpoint
//!
//! Request: `{"statements":[{"statement": <string>, "parameters": <object>}]}`
//!
//! Response: `{"results":[{"columns":[..],"data":[{"row":[..],"meta":[..]}]}],"errors":[..]}`

use crate::error::{BridgeError, Result};
use crate::types::{Params, RowMapping};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
struct TransactionRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Params,
}

/// Decoded response envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionResponse {
    /// One entry per submitted statement
    #[serde(default)]
    pub results: Vec<QueryResult>,

    /// Errors reported by the database; non-empty means the statement failed
    #[serde(default)]
    pub errors: Vec<ServerError>,
}

/// Result of one statement
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResult {
    /// Column names in declaration order
    #[serde(default)]
    pub columns: Vec<String>,

    /// Result records in database order
    #[serde(default)]
    pub data: Vec<Record>,
}

/// One result record, positional against `QueryResult::columns`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub row: Vec<Value>,

    /// Per-column metadata (`{"id":..,"type":"node",..}` for entities, null for scalars)
    #[serde(default)]
    pub meta: Vec<Value>,
}

/// Error entry of the envelope
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: String,
}

impl From<ServerError> for BridgeError {
    fn from(err: ServerError) -> Self {
        BridgeError::Database {
            message: err.message,
            code: err.code,
        }
    }
}

impl QueryResult {
    /// Zip column names against each record's row values
    pub fn into_rows(self) -> Vec<RowMapping> {
        let columns = self.columns;
        self.data
            .into_iter()
            .map(|record| {
                columns
                    .iter()
                    .cloned()
                    .zip(record.row)
                    .collect::<RowMapping>()
            })
            .collect()
    }
}

impl TransactionResponse {
    /// First statement result; an envelope without results is an empty result
    pub fn into_first_result(self) -> QueryResult {
        self.results.into_iter().next().unwrap_or_default()
    }
}

/// Serialize a single-statement transaction body.
///
/// Non-ASCII text is written as raw UTF-8, never as `\u` escapes.
pub fn encode_request(statement: &str, parameters: &Params) -> Result<Vec<u8>> {
    let body = TransactionRequest {
        statements: [Statement {
            statement,
            parameters,
        }],
    };
    Ok(serde_json::to_vec(&body)?)
}

/// Decode a response body. Invalid UTF-8 or JSON is a malformed body, i.e. a transport failure.
pub fn decode_response(body: &[u8]) -> Result<TransactionResponse> {
    let text = std::str::from_utf8(body)
        .map_err(|e| BridgeError::Transport(format!("Response body is not valid UTF-8: {}", e)))?;

    serde_json::from_str(text)
        .map_err(|e| BridgeError::Transport(format!("Failed to parse response body: {}", e)))
}
