//! Connection configuration for the Neo4j transaction endpoint
//!
//! Settings are layered, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config <path>` or `neo4j-mcp.toml` in the working directory)
//! 3. Environment variables (`NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`,
//!    `HTTP_PROXY`, `HTTPS_PROXY`, `NEO4J_ACCEPT_INVALID_CERTS`, `NEO4J_QUERY_TIMEOUT_SECS`)

use crate::error::{BridgeError, Result};
use base64::Engine;
use config::{Config, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default HTTP address of a local Neo4j server
pub const DEFAULT_URI: &str = "http://localhost:7474";

/// Default username
pub const DEFAULT_USERNAME: &str = "neo4j";

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "neo4j-mcp.toml";

/// Default deadline for network-issuing tool calls
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Path of the single-statement commit endpoint, relative to the URI
const TRANSACTION_PATH: &str = "/db/data/transaction/commit";

/// Environment variable to config key mapping
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("NEO4J_URI", "uri"),
    ("NEO4J_USERNAME", "username"),
    ("NEO4J_PASSWORD", "password"),
    ("HTTP_PROXY", "http_proxy"),
    ("HTTPS_PROXY", "https_proxy"),
    ("NEO4J_ACCEPT_INVALID_CERTS", "accept_invalid_certs"),
    ("NEO4J_QUERY_TIMEOUT_SECS", "query_timeout_secs"),
];

#[derive(Debug, Deserialize)]
struct RawConfig {
    uri: String,
    username: String,
    password: String,
    http_proxy: Option<String>,
    https_proxy: Option<String>,
    accept_invalid_certs: bool,
    query_timeout_secs: u64,
}

/// Connection descriptor, immutable once built
#[derive(Debug)]
pub struct Neo4jConfig {
    /// Base HTTP(S) URI of the server, without trailing slash
    pub uri: String,

    /// Basic-auth username
    pub username: String,

    /// Basic-auth password (redacted in Debug output)
    pub password: SecretString,

    /// Proxy for plain HTTP traffic
    pub http_proxy: Option<String>,

    /// Proxy for HTTPS traffic
    pub https_proxy: Option<String>,

    /// Skip TLS certificate validation
    pub accept_invalid_certs: bool,

    /// Deadline applied to every network-issuing tool call
    pub query_timeout: Duration,
}

impl Neo4jConfig {
    /// Build a config from explicit values, using defaults for everything else
    pub fn new(uri: impl Into<String>, username: impl Into<String>, password: &str) -> Result<Self> {
        Self::from_raw(RawConfig {
            uri: uri.into(),
            username: username.into(),
            password: password.to_string(),
            http_proxy: None,
            https_proxy: None,
            accept_invalid_certs: true,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        })
    }

    /// Load configuration from defaults, an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load configuration with a custom environment lookup
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder()
            .set_default("uri", DEFAULT_URI)?
            .set_default("username", DEFAULT_USERNAME)?
            .set_default("password", "")?
            .set_default("accept_invalid_certs", true)?
            .set_default("query_timeout_secs", DEFAULT_QUERY_TIMEOUT_SECS as i64)?;

        builder = match path {
            Some(path) => {
                debug!("Loading configuration file: {}", path.display());
                builder.add_source(File::from(path).format(FileFormat::Toml).required(true))
            }
            None => builder.add_source(
                File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
            ),
        };

        for (var, key) in ENV_OVERRIDES {
            let value = lookup(var).filter(|v| !v.is_empty());
            if value.is_some() {
                debug!("Configuration override from {}", var);
            }
            builder = builder.set_override_option(*key, value)?;
        }

        let raw: RawConfig = builder.build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let uri = raw.uri.trim().trim_end_matches('/').to_string();
        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            return Err(invalid(format!(
                "NEO4J_URI must use http:// or https:// (got '{}')",
                uri
            )));
        }

        if raw.username.trim().is_empty() {
            return Err(invalid("NEO4J_USERNAME cannot be empty"));
        }

        if raw.query_timeout_secs == 0 {
            return Err(invalid("query timeout must be at least one second"));
        }

        Ok(Self {
            uri,
            username: raw.username,
            password: SecretString::new(raw.password.into()),
            http_proxy: raw.http_proxy.filter(|p| !p.is_empty()),
            https_proxy: raw.https_proxy.filter(|p| !p.is_empty()),
            accept_invalid_certs: raw.accept_invalid_certs,
            query_timeout: Duration::from_secs(raw.query_timeout_secs),
        })
    }

    /// Set the tool-call deadline
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set proxies for HTTP and HTTPS traffic
    pub fn with_proxies(mut self, http: Option<String>, https: Option<String>) -> Self {
        self.http_proxy = http;
        self.https_proxy = https;
        self
    }

    /// URL of the single-statement commit endpoint
    pub fn transaction_endpoint(&self) -> String {
        format!("{}{}", self.uri, TRANSACTION_PATH)
    }

    /// `Authorization` header value for Basic authentication
    pub fn authorization_header(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password.expose_secret());
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes())
        )
    }
}

fn invalid(message: impl Into<String>) -> BridgeError {
    BridgeError::Config(config::ConfigError::Message(message.into()))
}
