//! Query synthesis: question text to candidate Cypher via a completion service.

use std::sync::OnceLock;
use std::time::Duration;

use biograph_core::config::CompletionSettings;
use biograph_core::{CandidateQuery, Question, SchemaDescriptor};
use regex::Regex;

use crate::completion::{CompletionRequest, CompletionService};
use crate::error::SynthesisError;
use crate::prompt::{decline_phrase, system_prompt};

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)```[a-z]*\n?").expect("valid regex"))
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*query:?\s*").expect("valid regex"))
}

/// Turns questions into candidate queries. Never fails: every error is
/// folded into [`CandidateQuery::Failure`].
pub struct QuerySynthesizer<C> {
    service: C,
    system_prompt: String,
    temperature: f32,
    timeout: Duration,
}

impl<C: CompletionService> QuerySynthesizer<C> {
    pub fn new(service: C, schema: &SchemaDescriptor, settings: &CompletionSettings) -> Self {
        Self {
            service,
            system_prompt: system_prompt(schema),
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    /// Synthesize a candidate query for the normalized question.
    pub async fn synthesize(&self, question: &Question) -> CandidateQuery {
        let request = CompletionRequest {
            system: self.system_prompt.clone(),
            user: question.normalized().to_string(),
            temperature: self.temperature,
        };

        let raw = match self.complete_bounded(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    question = %question.normalized(),
                    model = %self.service.model(),
                    error = %e,
                    "Cypher generation failed"
                );
                return CandidateQuery::Failure;
            }
        };

        let candidate = clean_response(&raw);
        match &candidate {
            CandidateQuery::Query(cypher) => {
                tracing::info!(question = %question.normalized(), query = %cypher, "Cypher generated");
            }
            CandidateQuery::Failure => {
                tracing::warn!(
                    question = %question.normalized(),
                    "Model could not generate a Cypher query"
                );
            }
        }
        candidate
    }

    async fn complete_bounded(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
        tokio::time::timeout(self.timeout, self.service.complete(request))
            .await
            .map_err(|_| SynthesisError::Timeout(self.timeout.as_secs()))?
    }
}

/// Strip code fences and a leading `query:` label, then detect the decline
/// sentinel. An empty remainder is also a failure.
pub fn clean_response(raw: &str) -> CandidateQuery {
    let unfenced = fence_re().replace_all(raw.trim(), "");
    let unlabeled = label_re().replace(&unfenced, "");
    let cypher = unlabeled.trim();

    if cypher.is_empty() || is_decline(cypher) {
        return CandidateQuery::Failure;
    }
    CandidateQuery::Query(cypher.to_string())
}

fn is_decline(text: &str) -> bool {
    text.trim_start_matches('/')
        .trim_start()
        .to_lowercase()
        .starts_with(decline_phrase())
}
