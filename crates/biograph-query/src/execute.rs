//! Execution and normalization: run the final query once, rename fields,
//! export, and summarize.

use biograph_core::config::ExportSettings;
use biograph_core::{FinalQuery, PresentationResult, Record, RequestId};
use biograph_graph::GraphStore;

use crate::{export, preview};

pub struct Executor<S> {
    store: S,
    export: ExportSettings,
}

impl<S: GraphStore> Executor<S> {
    pub fn new(store: S, export: ExportSettings) -> Self {
        Self { store, export }
    }

    /// Execute `query` exactly once and turn the outcome into a presentation
    /// result. Store and export failures are reported, never raised.
    pub async fn execute(
        &self,
        query: &FinalQuery,
        question: &str,
        request_id: RequestId,
    ) -> PresentationResult {
        let records = match self.store.execute_read(&query.cypher).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(question = %question, error = %e, "Query failed");
                return PresentationResult::ExecutionError {
                    question: question.to_string(),
                    message: e.to_string(),
                };
            }
        };

        if records.is_empty() {
            tracing::info!(question = %question, fallback = query.is_fallback(), "No rows returned");
            return PresentationResult::Empty {
                question: question.to_string(),
                query: query.cypher.clone(),
            };
        }

        let renamed: Vec<Record> = records.iter().map(Record::renamed).collect();
        let columns = preview::columns(&renamed);
        let path = export::export_path(&self.export, request_id);

        if let Err(e) = export::write_workbook(&path, &columns, &renamed, question) {
            tracing::error!(path = %path.display(), error = %e, "Export failed");
            return PresentationResult::ExecutionError {
                question: question.to_string(),
                message: e.to_string(),
            };
        }

        tracing::info!(
            question = %question,
            rows = renamed.len(),
            path = %path.display(),
            "Query successful"
        );
        PresentationResult::Success {
            question: question.to_string(),
            preview: preview::render_table(&columns, &renamed, self.export.preview_rows),
            columns,
            total_rows: renamed.len(),
            export_path: path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use biograph_core::ResultSet;
    use std::time::{Duration, Instant};

    use biograph_core::config::Neo4jSettings;
    use biograph_graph::{GraphConfig, GraphError, LazyGraphClient};
    use serde_json::json;

    struct OneRow;

    #[async_trait]
    impl GraphStore for OneRow {
        async fn execute_read(&self, _cypher: &str) -> Result<ResultSet, GraphError> {
            Ok(vec![[("gene_name".to_string(), json!("TP53"))]
                .into_iter()
                .collect()])
        }
    }

    #[tokio::test]
    async fn test_success_renames_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ExportSettings {
            dir: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        let executor = Executor::new(OneRow, settings);
        let query = FinalQuery::synthesized("MATCH (t:Target) RETURN t.gene_name AS gene_name");

        let result = executor.execute(&query, "Genes", RequestId::new()).await;
        match result {
            PresentationResult::Success {
                columns,
                preview,
                export_path,
                ..
            } => {
                assert_eq!(columns, vec!["Gene name"]);
                assert_eq!(preview, "Gene name\nTP53");
                assert!(export_path.starts_with(dir.path()));
                assert!(export_path.exists());
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_export_failure_becomes_error_result() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let settings = ExportSettings {
            dir: blocker.join("out").to_string_lossy().into_owned(),
            ..Default::default()
        };
        let executor = Executor::new(OneRow, settings);
        let query = FinalQuery::synthesized("MATCH (t:Target) RETURN t.gene_name AS gene_name");

        let result = executor.execute(&query, "Genes", RequestId::new()).await;
        assert!(matches!(
            result,
            PresentationResult::ExecutionError { ref question, .. } if question == "Genes"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store_reports_connection_error_promptly() {
        let dir = tempfile::tempdir().unwrap();
        let neo4j = Neo4jSettings {
            uri: "bolt://127.0.0.1:1".into(),
            timeout_secs: 5,
            ..Default::default()
        };
        let settings = ExportSettings {
            dir: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        let executor = Executor::new(LazyGraphClient::new(GraphConfig::from(&neo4j)), settings);

        let started = Instant::now();
        let result = executor
            .execute(&FinalQuery::synthesized("RETURN 1 AS x"), "Q", RequestId::new())
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        match result {
            PresentationResult::ExecutionError { question, message } => {
                assert_eq!(question, "Q");
                assert!(message.contains("cannot reach 127.0.0.1:1"), "{message}");
            }
            other => panic!("expected execution error, got {other:?}"),
        }
    }
}
