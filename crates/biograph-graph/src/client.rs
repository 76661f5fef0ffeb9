//! Neo4j connection management and shared graph client.

use std::time::Duration;

use biograph_core::config::Neo4jSettings;
use neo4rs::{ConfigBuilder, Graph, Query};
use tokio::net::TcpStream;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("No response from Neo4j at {uri} within {secs}s")]
    Timeout { uri: String, secs: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    pub query_timeout: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::from(&Neo4jSettings::default())
    }
}

impl From<&Neo4jSettings> for GraphConfig {
    fn from(settings: &Neo4jSettings) -> Self {
        Self {
            uri: settings.uri.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
            query_timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    uri: String,
    query_timeout: Duration,
}

impl GraphClient {
    /// Build a pooled client for the given configuration.
    ///
    /// neo4rs opens connections lazily, so this does not contact the server;
    /// see [`check_reachable`] for that.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Neo4j client ready");
        Ok(Self {
            graph,
            uri: config.uri.clone(),
            query_timeout: config.query_timeout,
        })
    }

    /// Execute a write-only query (CREATE, MERGE, DELETE, SET).
    pub async fn run(&self, query: Query) -> Result<()> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and collect all rows.
    ///
    /// The pooled connection backing the stream is returned when the stream
    /// drops, on success and on every error path.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// [`query_rows`](Self::query_rows) bounded by the configured timeout.
    pub async fn query_rows_bounded(
        &self,
        query: Query,
    ) -> Result<Vec<neo4rs::Row>> {
        tokio::time::timeout(self.query_timeout, self.query_rows(query))
            .await
            .map_err(|_| GraphError::Timeout {
                uri: self.uri.clone(),
                secs: self.query_timeout.as_secs(),
            })?
    }
}

/// Host and port of a Bolt URI (`bolt://`, `neo4j://`, `bolt+s://`, ...).
///
/// Userinfo is ignored and the port defaults to 7687.
pub fn bolt_address(uri: &str) -> Result<(String, u16)> {
    let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let authority = rest.split(['/', '?']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    if host_port.is_empty() {
        return Err(GraphError::Connection(format!("no host in Neo4j URI {uri:?}")));
    }

    let (host, port) = match host_port.strip_prefix('[') {
        Some(v6) => {
            let (host, tail) = v6
                .split_once(']')
                .ok_or_else(|| GraphError::Connection(format!("bad IPv6 host in {uri:?}")))?;
            (host, tail.strip_prefix(':'))
        }
        None => match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        },
    };

    let port: u16 = match port {
        Some(p) => p
            .parse()
            .map_err(|_| GraphError::Connection(format!("bad port {p:?} in Neo4j URI {uri:?}")))?,
        None => 7687,
    };
    Ok((host.to_string(), port))
}

/// Open and drop one TCP connection to the Bolt endpoint, bounded by `limit`.
///
/// Turns an unreachable store into an immediate connection error instead of
/// letting the driver's pool retry until the query deadline.
pub async fn check_reachable(uri: &str, limit: Duration) -> Result<()> {
    let (host, port) = bolt_address(uri)?;
    match tokio::time::timeout(limit, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(GraphError::Connection(format!(
            "cannot reach {host}:{port}: {e}"
        ))),
        Err(_) => Err(GraphError::Connection(format!(
            "no response from {host}:{port} within {}s",
            limit.as_secs()
        ))),
    }
}
