//! Common test utilities and helpers

#![allow(dead_code)]

use neo4j_mcp::{Neo4jClient, Neo4jConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the commit endpoint served by the mock
pub const TX_PATH: &str = "/db/data/transaction/commit";

/// Connection descriptor pointing at a mock server
pub fn config_for(server: &MockServer) -> Neo4jConfig {
    Neo4jConfig::new(server.uri(), "neo4j", "password").expect("valid test config")
}

/// Client pointing at a mock server
pub fn client_for(server: &MockServer) -> Neo4jClient {
    Neo4jClient::new(&config_for(server)).expect("client builds")
}

/// Successful envelope with the given columns and row values
pub fn success_body(columns: &[&str], rows: Vec<Value>) -> Value {
    let data: Vec<Value> = rows
        .into_iter()
        .map(|row| json!({"row": row, "meta": []}))
        .collect();
    json!({
        "results": [{"columns": columns, "data": data}],
        "errors": []
    })
}

/// Envelope carrying one database error
pub fn error_body(code: &str, message: &str) -> Value {
    json!({
        "results": [],
        "errors": [{"code": code, "message": message}]
    })
}

/// Mount a single POST handler answering every request with `body`
pub async fn mount_json(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Decoded JSON bodies of every request the mock received
pub async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("request body is JSON"))
        .collect()
}
