//! End-to-end tool tests: ToolHandler -> Neo4jClient -> mock transaction endpoint

mod common;

use common::*;
use neo4j_mcp::{BridgeError, EntityOperations, Neo4jClient, ToolHandler};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn handler_for(server: &MockServer, deadline: Duration) -> (ToolHandler, Arc<Neo4jClient>) {
    let client = Arc::new(client_for(server));
    (ToolHandler::new(client.clone(), deadline), client)
}

#[tokio::test]
async fn test_create_node_returns_row_and_meta() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TX_PATH))
        .and(body_string_contains("CREATE (n:`Person` $props)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(
            &["n", "id", "labels"],
            vec![json!([{"name": "Alice"}, 0, ["Person"]])],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (handler, _client) = handler_for(&server, Duration::from_secs(30));
    let result = handler
        .execute(
            "create_node",
            json!({"label": "Person", "properties": {"name": "Alice"}}),
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        json!({"row": {"name": "Alice"}, "meta": {"id": 0, "labels": ["Person"]}})
    );

    let bodies = received_bodies(&server).await;
    assert_eq!(
        bodies[0]["statements"][0]["parameters"],
        json!({"props": {"name": "Alice"}})
    );
}

#[tokio::test]
async fn test_repeated_create_node_yields_distinct_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(
            &["n", "id", "labels"],
            vec![json!([{"name": "Alice"}, 0, ["Person"]])],
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(
            &["n", "id", "labels"],
            vec![json!([{"name": "Alice"}, 1, ["Person"]])],
        )))
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server));
    let entities = EntityOperations::new(client);
    let mut props = serde_json::Map::new();
    props.insert("name".to_string(), json!("Alice"));

    let first = entities.create_node("Person", props.clone()).await.unwrap();
    let second = entities.create_node("Person", props).await.unwrap();
    assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn test_create_relationship_returns_properties() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TX_PATH))
        .and(body_string_contains("CREATE (from)-[r:`KNOWS`]->(to)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(
            &["r", "id", "type"],
            vec![json!([{"since": 2020}, 5, "KNOWS"])],
        )))
        .mount(&server)
        .await;

    let (handler, _client) = handler_for(&server, Duration::from_secs(30));
    let result = handler
        .execute(
            "create_relationship",
            json!({
                "from_node_id": 1,
                "to_node_id": 2,
                "rel_type": "KNOWS",
                "properties": {"since": 2020}
            }),
        )
        .await
        .unwrap();

    assert_eq!(result["row"], json!({"since": 2020}));
    assert_eq!(result["meta"]["type"], json!("KNOWS"));

    let bodies = received_bodies(&server).await;
    let sent = &bodies[0]["statements"][0]["parameters"];
    assert_eq!(sent["from_id"], json!(1));
    assert_eq!(sent["to_id"], json!(2));
}

#[tokio::test]
async fn test_create_relationship_with_missing_node_fails() {
    let server = MockServer::start().await;
    mount_json(&server, 200, success_body(&["r", "id", "type"], vec![])).await;

    let (handler, _client) = handler_for(&server, Duration::from_secs(30));
    let err = handler
        .execute(
            "create_relationship",
            json!({"from_node_id": 1, "to_node_id": 424242, "rel_type": "KNOWS"}),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::EntityCreation(_)));
}

#[tokio::test]
async fn test_unsafe_relationship_type_never_reaches_server() {
    let server = MockServer::start().await;
    mount_json(&server, 200, success_body(&["r"], vec![])).await;

    let (handler, _client) = handler_for(&server, Duration::from_secs(30));
    let err = handler
        .execute(
            "create_relationship",
            json!({"from_node_id": 1, "to_node_id": 2, "rel_type": "KNOWS]->(x) DETACH DELETE x//"}),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::InvalidIdentifier(_)));
    assert!(received_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn test_execute_query_deadline_is_timeout_not_database_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TX_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_body(&["x"], vec![json!([1])]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let (handler, _client) = handler_for(&server, Duration::from_secs(1));
    let err = handler
        .execute("execute_query", json!({"query": "RETURN 1 AS x"}))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Timeout { seconds: 1, .. }));
    assert_eq!(err.kind(), "timeout");
}

#[tokio::test]
async fn test_concurrent_calls_share_one_client() {
    let server = MockServer::start().await;
    mount_json(&server, 200, success_body(&["x"], vec![json!([1])])).await;

    let (handler, _client) = handler_for(&server, Duration::from_secs(30));
    let handler = Arc::new(handler);

    let calls = (0..8).map(|i| {
        let handler = handler.clone();
        tokio::spawn(async move {
            handler
                .execute("execute_query", json!({"query": "RETURN $i AS x", "params": {"i": i}}))
                .await
        })
    });

    for call in calls.collect::<Vec<_>>() {
        assert_eq!(call.await.unwrap().unwrap(), json!([{"x": 1}]));
    }
    assert_eq!(received_bodies(&server).await.len(), 8);
}

#[tokio::test]
async fn test_closed_client_fails_tool_calls() {
    let server = MockServer::start().await;
    mount_json(&server, 200, success_body(&["x"], vec![json!([1])])).await;

    let (handler, client) = handler_for(&server, Duration::from_secs(30));
    client.close();
    client.close();

    let err = handler
        .execute("execute_query", json!({"query": "RETURN 1 AS x"}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "transport");
}
