//! Fallback resolution: decide whether a synthesized query can be trusted,
//! and substitute the broad treatment template when it cannot.
//!
//! Each trigger is a separate predicate so its coverage can be asserted on
//! its own. Resolution happens exactly once per question.

use std::sync::OnceLock;

use biograph_core::config::ResolverSettings;
use biograph_core::{CandidateQuery, FinalQuery, SCHEMA};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Phrases that always route a question to the fallback template.
/// Removal from the question is case-sensitive.
pub const BROAD_PHRASES: [&str; 2] = ["treatments for", "drugs for"];

/// Why a candidate query was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTrigger {
    /// The synthesizer returned the failure sentinel.
    SynthesisFailed,
    /// The candidate matches `disease_name: "..."` inline instead of
    /// comparing through `toLower`.
    InlineDiseaseLiteral,
    /// The question asks for "treatments for" / "drugs for" something.
    BroadTreatmentPhrase,
    /// A `*_name` comparison skips `toLower(...)`. Only checked in strict mode.
    CaseSensitiveName,
}

/// Outcome of resolving one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub final_query: FinalQuery,
    pub triggers: Vec<FallbackTrigger>,
    /// Disease keyword embedded in the fallback template, if it was used.
    pub keyword: Option<String>,
}

impl Resolution {
    pub fn fell_back(&self) -> bool {
        !self.triggers.is_empty()
    }
}

fn inline_disease_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"disease_name\s*:\s*(?:"(.+?)"|'(.+?)')"#).expect("valid regex")
    })
}

/// `operand op operand`, where an operand is a `toLower(...)` call, a
/// property access, a string literal, a parameter, or a list literal.
fn comparison_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        const OPERAND: &str =
            r#"(toLower\s*\([^()]*\)|[A-Za-z_]\w*\.\w+|"[^"]*"|'[^']*'|\$\w+|\[[^\]]*\])"#;
        Regex::new(&format!(
            r"(?i){OPERAND}\s*(=~|<>|=|\bCONTAINS\b|\bSTARTS\s+WITH\b|\bENDS\s+WITH\b|\bIN\b)\s*{OPERAND}"
        ))
        .expect("valid regex")
    })
}

fn property_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_]\w*\.(\w+)$").expect("valid regex"))
}

// ── Trigger predicates ───────────────────────────────────────────

/// Trigger (a).
pub fn synthesis_failed(candidate: &CandidateQuery) -> bool {
    candidate.is_failure()
}

/// Trigger (b): the literal bound to an inline `disease_name` property match.
pub fn inline_disease_literal(cypher: &str) -> Option<&str> {
    let caps = inline_disease_re().captures(cypher)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Trigger (c).
pub fn has_broad_phrase(question: &str) -> bool {
    let lowered = question.to_lowercase();
    BROAD_PHRASES.iter().any(|p| lowered.contains(p))
}

/// Strict-mode trigger: true when a comparison has a bare schema name
/// property (not wrapped in `toLower(...)`) on either side.
///
/// Covers `=`, `<>`, `CONTAINS`, `STARTS WITH`, `ENDS WITH`, `IN` and `=~`;
/// a regex match whose pattern literal starts with `(?i)` is already
/// case-insensitive and passes. Comparisons whose operands are nested
/// expressions (`coalesce(...)`, arithmetic) are not inspected.
pub fn has_case_sensitive_name_comparison(cypher: &str) -> bool {
    comparison_re().captures_iter(cypher).any(|caps| {
        let (lhs, op, rhs) = (&caps[1], &caps[2], &caps[3]);
        if op == "=~" && is_case_insensitive_pattern(rhs) {
            return false;
        }
        is_bare_name_property(lhs) || is_bare_name_property(rhs)
    })
}

fn is_bare_name_property(operand: &str) -> bool {
    property_re()
        .captures(operand)
        .is_some_and(|caps| SCHEMA.name_properties().any(|p| p == &caps[1]))
}

fn is_case_insensitive_pattern(operand: &str) -> bool {
    operand
        .trim_matches(|c| c == '"' || c == '\'')
        .starts_with("(?i)")
}

// ── Keyword recovery and templates ───────────────────────────────

/// Recover the disease keyword from the question.
///
/// Takes the text after the last broad phrase when one is present
/// (case-sensitive), otherwise the whole question, then trims whitespace and
/// question marks from both ends.
pub fn keyword_from_question(question: &str) -> String {
    let tail = BROAD_PHRASES
        .iter()
        .filter_map(|phrase| question.rfind(phrase).map(|i| i + phrase.len()))
        .max()
        .map_or(question, |end| &question[end..]);
    tail.trim_matches(|c: char| c.is_whitespace() || c == '?')
        .to_string()
}

/// Escape a value for embedding in a double-quoted Cypher string literal.
fn cypher_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// The broad fallback: drugs treating any disease whose name contains the
/// keyword, widened through optional joins to targets, pathways, biomarkers,
/// and target-associated diseases.
pub fn fallback_query(keyword: &str) -> String {
    let keyword = cypher_string(&keyword.to_lowercase());
    format!(
        "MATCH (d:Drug)-[:TREATS_DISEASE]->(ds:Disease)
WHERE toLower(ds.disease_name) CONTAINS \"{keyword}\"
OPTIONAL MATCH (d)-[r:TARGETS]->(t:Target)
OPTIONAL MATCH (t)-[:INVOLVED_IN_PATHWAY]->(p:Pathway)
OPTIONAL MATCH (d)-[:HAS_BIOMARKER]->(b:Biomarker)
OPTIONAL MATCH (t)-[:ASSOCIATED_WITH_DISEASE]->(ds2:Disease)
RETURN DISTINCT
    d.drug_name AS drug_name,
    d.drug_smiles AS drug_smiles,
    r.drug_mechanism_of_action_on_target AS drug_mechanism,
    t.target_name AS target_name,
    t.gene_name AS gene_name,
    p.pathway_name AS pathway_name,
    ds.disease_name AS disease_name,
    b.biomarker_name AS biomarker_name"
    )
}

// ── Resolver ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FallbackResolver {
    strict_name_matching: bool,
}

impl FallbackResolver {
    pub fn new(settings: &ResolverSettings) -> Self {
        Self {
            strict_name_matching: settings.strict_name_matching,
        }
    }

    /// Evaluate every trigger against the raw question and candidate.
    pub fn triggers(&self, question: &str, candidate: &CandidateQuery) -> Vec<FallbackTrigger> {
        let mut fired = Vec::new();
        if synthesis_failed(candidate) {
            fired.push(FallbackTrigger::SynthesisFailed);
        }
        if let Some(cypher) = candidate.text() {
            if inline_disease_literal(cypher).is_some() {
                fired.push(FallbackTrigger::InlineDiseaseLiteral);
            }
        }
        if has_broad_phrase(question) {
            fired.push(FallbackTrigger::BroadTreatmentPhrase);
        }
        if self.strict_name_matching {
            if let Some(cypher) = candidate.text() {
                if has_case_sensitive_name_comparison(cypher) {
                    fired.push(FallbackTrigger::CaseSensitiveName);
                }
            }
        }
        fired
    }

    /// Choose the final query for a question.
    pub fn resolve(&self, question: &str, candidate: &CandidateQuery) -> Resolution {
        let triggers = self.triggers(question, candidate);

        let cypher = match candidate.text() {
            Some(cypher) if triggers.is_empty() => {
                return Resolution {
                    final_query: FinalQuery::synthesized(cypher),
                    triggers,
                    keyword: None,
                };
            }
            other => other,
        };

        let keyword = cypher
            .and_then(inline_disease_literal)
            .map(str::to_string)
            .unwrap_or_else(|| keyword_from_question(question));
        let rewritten = fallback_query(&keyword);

        tracing::info!(
            question = %question,
            triggers = ?triggers,
            keyword = %keyword,
            "Fallback triggered"
        );
        tracing::debug!(query = %rewritten, "Fallback query");

        Resolution {
            final_query: FinalQuery::fallback(rewritten),
            triggers,
            keyword: Some(keyword),
        }
    }
}
