//! The read-only graph store seam used by the query pipeline.

use std::collections::HashMap;

use async_trait::async_trait;
use biograph_core::{Record, ResultSet};
use neo4rs::query;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::client::{check_reachable, GraphClient, GraphConfig, GraphError, Result};
use crate::projection::projection_columns;

/// Executes one read query and materializes every returned row.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn execute_read(&self, cypher: &str) -> Result<ResultSet>;
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn execute_read(&self, cypher: &str) -> Result<ResultSet> {
        let rows = self.query_rows_bounded(query(cypher)).await?;
        let columns = projection_columns(cypher);

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let values: HashMap<String, Value> = row.to().map_err(|e| {
                GraphError::Serialization(format!("Failed to deserialize row: {e}"))
            })?;
            records.push(order_record(values, &columns));
        }

        tracing::debug!(rows = records.len(), "Materialized query rows");
        Ok(records)
    }
}

/// A client that connects on first use.
///
/// The Bolt endpoint's TCP port is checked before the pool is built, so an
/// unreachable store surfaces as a connection error for the question being
/// answered instead of aborting startup or waiting out the query deadline.
/// A failed check leaves the client unset and the next question tries again.
pub struct LazyGraphClient {
    config: GraphConfig,
    client: OnceCell<GraphClient>,
}

impl LazyGraphClient {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&GraphClient> {
        self.client
            .get_or_try_init(|| async {
                check_reachable(&self.config.uri, self.config.query_timeout).await?;
                GraphClient::connect(&self.config).await
            })
            .await
    }
}

#[async_trait]
impl GraphStore for LazyGraphClient {
    async fn execute_read(&self, cypher: &str) -> Result<ResultSet> {
        self.client().await?.execute_read(cypher).await
    }
}

/// Build a record with projection columns first, then any remaining keys sorted.
pub fn order_record(mut values: HashMap<String, Value>, columns: &[String]) -> Record {
    let mut record = Record::new();
    for column in columns {
        if let Some(value) = values.remove(column) {
            record.insert(column.clone(), value);
        }
    }

    let mut rest: Vec<_> = values.into_iter().collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in rest {
        record.insert(name, value);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_record_follows_projection() {
        let values: HashMap<String, Value> = [
            ("gene_name".to_string(), json!("TP53")),
            ("drug_name".to_string(), json!("Nutlin")),
            ("zeta".to_string(), Value::Null),
            ("alpha".to_string(), json!(1)),
        ]
        .into_iter()
        .collect();
        let columns = vec!["drug_name".to_string(), "gene_name".to_string()];

        let record = order_record(values, &columns);
        assert_eq!(
            record.columns().collect::<Vec<_>>(),
            vec!["drug_name", "gene_name", "alpha", "zeta"]
        );
        assert_eq!(record.get("zeta"), Some(&Value::Null));
    }

    #[test]
    fn test_order_record_skips_missing_projection_columns() {
        let values: HashMap<String, Value> =
            [("n".to_string(), json!("x"))].into_iter().collect();
        let record = order_record(values, &["missing".to_string()]);
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["n"]);
    }
}
