//! Per-question orchestration: synthesize, resolve, execute.

use biograph_core::{
    BiographConfig, CandidateQuery, FinalQuery, PresentationResult, Question, RequestId, SCHEMA,
};
use biograph_graph::GraphStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;

use crate::completion::CompletionService;
use crate::execute::Executor;
use crate::resolve::{FallbackResolver, FallbackTrigger, Resolution};
use crate::synthesize::QuerySynthesizer;

/// Everything known about one answered question.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub request_id: RequestId,
    pub asked_at: DateTime<Utc>,
    /// Normalized question text.
    pub question: String,
    pub candidate: CandidateQuery,
    pub final_query: FinalQuery,
    pub triggers: Vec<FallbackTrigger>,
    pub keyword: Option<String>,
    pub result: PresentationResult,
}

/// Synthesis and resolution without execution.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPlan {
    pub question: Question,
    pub candidate: CandidateQuery,
    pub resolution: Resolution,
}

/// Holds no per-question state; concurrent `ask` calls are independent.
pub struct QueryPipeline<C, S> {
    synthesizer: QuerySynthesizer<C>,
    resolver: FallbackResolver,
    executor: Executor<S>,
}

impl<C: CompletionService, S: GraphStore> QueryPipeline<C, S> {
    pub fn new(
        synthesizer: QuerySynthesizer<C>,
        resolver: FallbackResolver,
        executor: Executor<S>,
    ) -> Self {
        Self {
            synthesizer,
            resolver,
            executor,
        }
    }

    /// Wire a pipeline from configuration around the given backends.
    pub fn from_config(config: &BiographConfig, completion: C, store: S) -> Self {
        Self::new(
            QuerySynthesizer::new(completion, &SCHEMA, &config.completion),
            FallbackResolver::new(&config.resolver),
            Executor::new(store, config.export.clone()),
        )
    }

    /// Synthesize and resolve, stopping before the store is touched.
    pub async fn plan(&self, raw_question: &str) -> QueryPlan {
        let question = Question::new(raw_question);
        let candidate = self.synthesizer.synthesize(&question).await;
        let resolution = self.resolver.resolve(question.raw(), &candidate);
        QueryPlan {
            question,
            candidate,
            resolution,
        }
    }

    /// Answer one question end to end. Always terminates in a presentation
    /// result; the final query is executed exactly once.
    pub async fn ask(&self, raw_question: &str) -> PipelineOutcome {
        let request_id = RequestId::new();
        let span = tracing::info_span!("ask", request_id = %request_id);
        self.answer(raw_question, request_id).instrument(span).await
    }

    async fn answer(&self, raw_question: &str, request_id: RequestId) -> PipelineOutcome {
        let asked_at = Utc::now();
        let QueryPlan {
            question,
            candidate,
            resolution,
        } = self.plan(raw_question).await;

        let result = self
            .executor
            .execute(&resolution.final_query, question.normalized(), request_id)
            .await;

        PipelineOutcome {
            request_id,
            asked_at,
            question: question.normalized().to_string(),
            candidate,
            final_query: resolution.final_query,
            triggers: resolution.triggers,
            keyword: resolution.keyword,
            result,
        }
    }
}
