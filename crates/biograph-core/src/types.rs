//! Core domain types for the Biograph query pipeline.
//!
//! These types carry one question through synthesis, resolution, execution,
//! and presentation. None of them outlive a single pipeline run.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ── Request ───────────────────────────────────────────────────────

/// Identity of a single pipeline run. Keys request-scoped artifacts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ── Question ──────────────────────────────────────────────────────

/// A user question in both its raw and normalized forms.
///
/// The raw text drives fallback detection; the normalized text is what the
/// completion service sees and what is shown back to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    raw: String,
    normalized: String,
}

impl Question {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize_question(&raw);
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Trim, drop trailing question marks, and upper-case the first letter.
fn normalize_question(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('?').trim_end();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Queries ───────────────────────────────────────────────────────

/// Output of the synthesizer: a query string, or the failure sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "cypher", rename_all = "snake_case")]
pub enum CandidateQuery {
    Query(String),
    Failure,
}

impl CandidateQuery {
    /// The query text, if synthesis produced one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Query(q) => Some(q),
            Self::Failure => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }
}

/// Where the executed query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    Synthesized,
    Fallback,
}

/// The query actually executed against the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalQuery {
    pub cypher: String,
    pub source: QuerySource,
}

impl FinalQuery {
    pub fn synthesized(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            source: QuerySource::Synthesized,
        }
    }

    pub fn fallback(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            source: QuerySource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == QuerySource::Fallback
    }
}

impl fmt::Display for FinalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cypher)
    }
}

// ── Records ───────────────────────────────────────────────────────

/// One result row: field names mapped to scalar values, in projection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing the value if the name already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Return a copy with every field name passed through [`rename_field`].
    pub fn renamed(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|(n, v)| (rename_field(n), v.clone()))
                .collect(),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// Ordered result rows, possibly empty.
pub type ResultSet = Vec<Record>;

/// Presentation form of a field name: `"drug_name"` becomes `"Drug name"`.
///
/// Underscores become spaces first, then the first character is upper-cased
/// and the remainder lower-cased.
pub fn rename_field(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// ── Presentation ──────────────────────────────────────────────────

/// Terminal state of one question, ready to show to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PresentationResult {
    Success {
        question: String,
        columns: Vec<String>,
        total_rows: usize,
        /// Aligned text table of the first rows.
        preview: String,
        export_path: PathBuf,
    },
    Empty {
        question: String,
        query: String,
    },
    ExecutionError {
        question: String,
        message: String,
    },
}

impl PresentationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::ExecutionError { .. })
    }
}

impl fmt::Display for PresentationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                question,
                preview,
                export_path,
                ..
            } => write!(
                f,
                "Query successful for: \"{question}\"\n\nTop results:\n{preview}\n\nFull results saved to: {}",
                export_path.display()
            ),
            Self::Empty { question, query } => write!(
                f,
                "No data found in Neo4j for:\n\"{question}\"\n\n[Cypher Used] {query}"
            ),
            Self::ExecutionError { question, message } => write!(
                f,
                "An error occurred while querying Neo4j for:\n\"{question}\"\n\nError: {message}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_normalization() {
        let q = Question::new("  which drugs treat Acute pain?  ");
        assert_eq!(q.normalized(), "Which drugs treat Acute pain");
        assert_eq!(q.raw(), "  which drugs treat Acute pain?  ");
    }

    #[test]
    fn test_question_normalization_keeps_inner_case() {
        let q = Question::new("what targets TP53??");
        assert_eq!(q.normalized(), "What targets TP53");
        assert_eq!(Question::new("   ").normalized(), "");
    }

    #[test]
    fn test_rename_field() {
        assert_eq!(rename_field("drug_name"), "Drug name");
        assert_eq!(rename_field("disease_name"), "Disease name");
        assert_eq!(rename_field("d.drug_name"), "D.drug name");
        assert_eq!(rename_field("drugSMILES"), "Drugsmiles");
        assert_eq!(rename_field(""), "");
    }

    #[test]
    fn test_rename_field_is_stable_on_renamed_names() {
        for name in ["drug_name", "gene_name", "drug_mechanism"] {
            let once = rename_field(name);
            assert_eq!(rename_field(&once), once);
        }
    }

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut r = Record::new();
        r.insert("drug_name", json!("Aspirin"));
        r.insert("disease_name", json!("Pain"));
        r.insert("drug_name", json!("Ibuprofen"));
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["drug_name", "disease_name"]);
        assert_eq!(r.get("drug_name"), Some(&json!("Ibuprofen")));

        let renamed = r.renamed();
        assert_eq!(renamed.columns().collect::<Vec<_>>(), vec!["Drug name", "Disease name"]);
    }

    #[test]
    fn test_presentation_text() {
        let empty = PresentationResult::Empty {
            question: "Drugs for nothing".into(),
            query: "MATCH (n) RETURN n".into(),
        };
        assert_eq!(
            empty.to_string(),
            "No data found in Neo4j for:\n\"Drugs for nothing\"\n\n[Cypher Used] MATCH (n) RETURN n"
        );

        let err = PresentationResult::ExecutionError {
            question: "Q".into(),
            message: "connection refused".into(),
        };
        assert!(err.is_error());
        assert!(err.to_string().ends_with("Error: connection refused"));
    }

    #[test]
    fn test_presentation_serializes_status_tag() {
        let empty = PresentationResult::Empty {
            question: "Q".into(),
            query: "RETURN 1".into(),
        };
        let v = serde_json::to_value(&empty).unwrap();
        assert_eq!(v["status"], "empty");
        assert_eq!(v["query"], "RETURN 1");
    }
}
