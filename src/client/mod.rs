//! Query execution client for the Neo4j HTTP transaction endpoint
//!
//! Owns the persistent HTTP client, encodes single-statement transactions,
//! interprets the response envelope and applies the one-shot
//! `labels(n) CONTAINS` compatibility rewrite.

pub mod rewrite;
pub mod wire;

use crate::config::Neo4jConfig;
use crate::error::{BridgeError, Result};
use crate::types::{Params, RowMapping};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Proxy;
use rewrite::{is_label_list_mismatch, rewrite_labels_contains, Rewrite};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use wire::{decode_response, encode_request, ServerError};

pub use wire::{QueryResult, Record};

/// Rewrite-and-retry attempts allowed per call
const MAX_REWRITE_ATTEMPTS: u32 = 1;

/// Longest body excerpt carried in a transport error message
const BODY_EXCERPT_LEN: usize = 512;

/// Executes Cypher statements and returns their rows
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a statement and return the raw first statement result
    async fn execute_raw(&self, query: &str, params: &Params) -> Result<QueryResult>;

    /// Execute a statement and return its rows as column-name mappings
    async fn execute(&self, query: &str, params: &Params) -> Result<Vec<RowMapping>> {
        Ok(self.execute_raw(query, params).await?.into_rows())
    }
}

enum StatementOutcome {
    Success(QueryResult),
    Failed(ServerError),
}

/// HTTP client bound to one Neo4j server.
///
/// Headers (including the Basic credential) are computed once at construction;
/// the client holds no other mutable state, so it can be shared via `Arc`
/// across concurrent tool calls.
pub struct Neo4jClient {
    http: reqwest::Client,
    endpoint: String,
    span: Span,
    closed: AtomicBool,
}

impl Neo4jClient {
    /// Build a client from a connection descriptor
    pub fn new(config: &Neo4jConfig) -> Result<Self> {
        let endpoint = config.transaction_endpoint();

        let mut auth = HeaderValue::from_str(&config.authorization_header())
            .map_err(|e| invalid_config(format!("Invalid credentials header: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // Only the configured proxies apply; system proxy discovery is off
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .no_proxy()
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if config.accept_invalid_certs {
            warn!("TLS certificate validation is disabled for {}", config.uri);
        }

        if let Some(proxy) = &config.http_proxy {
            debug!("Using HTTP proxy: {}", proxy);
            builder = builder.proxy(
                Proxy::http(proxy)
                    .map_err(|e| invalid_config(format!("Invalid HTTP_PROXY '{}': {}", proxy, e)))?,
            );
        }
        if let Some(proxy) = &config.https_proxy {
            debug!("Using HTTPS proxy: {}", proxy);
            builder = builder.proxy(
                Proxy::https(proxy)
                    .map_err(|e| invalid_config(format!("Invalid HTTPS_PROXY '{}': {}", proxy, e)))?,
            );
        }

        let http = builder
            .build()
            .map_err(|e| invalid_config(format!("Failed to build HTTP client: {}", e)))?;

        info!("Neo4j client ready for {}", endpoint);

        Ok(Self {
            http,
            span: info_span!("neo4j_client", endpoint = %endpoint),
            endpoint,
            closed: AtomicBool::new(false),
        })
    }

    /// Transaction endpoint URL this client posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Release the client. Safe to call more than once.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("Neo4j client already closed");
        } else {
            info!("Closing Neo4j client");
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn run(&self, query: &str, params: &Params) -> Result<QueryResult> {
        let mut statement = Cow::Borrowed(query);
        let mut rewrites = 0;

        loop {
            let server_error = match self.submit(&statement, params).await? {
                StatementOutcome::Success(result) => {
                    debug!("Statement returned {} rows", result.data.len());
                    return Ok(result);
                }
                StatementOutcome::Failed(server_error) => server_error,
            };

            error!("Neo4j returned error: {}", server_error.message);

            if rewrites < MAX_REWRITE_ATTEMPTS && is_label_list_mismatch(&server_error.message) {
                match rewrite_labels_contains(&statement) {
                    Rewrite::Applied(rewritten) => {
                        warn!("Retrying with labels(..) CONTAINS rewritten to ANY(..)");
                        debug!("Rewritten query: {}", rewritten);
                        rewrites += 1;
                        statement = Cow::Owned(rewritten);
                        continue;
                    }
                    Rewrite::Declined(reason) => {
                        warn!("Label predicate rewrite declined: {}", reason);
                    }
                }
            }

            return Err(server_error.into());
        }
    }

    async fn submit(&self, statement: &str, params: &Params) -> Result<StatementOutcome> {
        if self.is_closed() {
            return Err(BridgeError::Transport("client is closed".to_string()));
        }

        let body = encode_request(statement, params)?;
        debug!("Sending request to {}", self.endpoint);
        debug!("Request payload: {}", String::from_utf8_lossy(&body));

        let response = self
            .http
            .post(&self.endpoint)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("HTTP request error: {}", e);
                BridgeError::Transport(format!("HTTP request error: {}", e))
            })?;

        let status = response.status();
        let raw = response.bytes().await.map_err(|e| {
            error!("Failed to read response body: {}", e);
            BridgeError::Transport(format!("Failed to read response body: {}", e))
        })?;
        debug!(
            "Received raw response ({}): {}",
            status,
            String::from_utf8_lossy(&raw)
        );

        let mut envelope = match decode_response(&raw) {
            Ok(envelope) => envelope,
            Err(e) if !status.is_success() => {
                error!("HTTP {} without a readable envelope: {}", status, e);
                return Err(http_status_error(status, &raw));
            }
            Err(e) => {
                error!("{}", e);
                error!("Raw response body: {}", String::from_utf8_lossy(&raw));
                return Err(e);
            }
        };

        if !envelope.errors.is_empty() {
            return Ok(StatementOutcome::Failed(envelope.errors.swap_remove(0)));
        }

        if !status.is_success() {
            error!("HTTP {} with an envelope carrying no errors", status);
            return Err(http_status_error(status, &raw));
        }

        Ok(StatementOutcome::Success(envelope.into_first_result()))
    }
}

#[async_trait]
impl QueryExecutor for Neo4jClient {
    async fn execute_raw(&self, query: &str, params: &Params) -> Result<QueryResult> {
        self.run(query, params).instrument(self.span.clone()).await
    }
}

fn http_status_error(status: reqwest::StatusCode, body: &[u8]) -> BridgeError {
    let text = String::from_utf8_lossy(body);
    let excerpt: String = text.chars().take(BODY_EXCERPT_LEN).collect();
    BridgeError::Transport(format!("HTTP {}: {}", status, excerpt))
}

fn invalid_config(message: String) -> BridgeError {
    BridgeError::Config(config::ConfigError::Message(message))
}
