//! System prompt for Cypher synthesis.
//!
//! The prompt is assembled once from the static schema and never varies per
//! question; only the user turn changes.

use biograph_core::SchemaDescriptor;

/// Text the model must emit when it cannot answer from the schema.
pub const UNABLE_SENTINEL: &str = "// unable to generate query";

/// A question paired with the exact query expected for it.
#[derive(Debug, Clone, Copy)]
pub struct WorkedExample {
    pub question: &'static str,
    pub cypher: &'static str,
}

/// Examples anchoring output style: explicit `WHERE` filters with
/// `toLower(...)` on both sides, `DISTINCT`, minimal projections.
pub const WORKED_EXAMPLES: &[WorkedExample] = &[
    WorkedExample {
        question: "Which drugs treat Acute pain?",
        cypher: "MATCH (d:Drug)-[:TREATS_DISEASE]->(ds:Disease)\n\
                 WHERE toLower(ds.disease_name) = toLower(\"Acute pain\")\n\
                 RETURN DISTINCT d.drug_name",
    },
    WorkedExample {
        question: "What are the drugs for Tuberculosis?",
        cypher: "MATCH (d:Drug)-[:TREATS_DISEASE]->(ds:Disease)\n\
                 WHERE toLower(ds.disease_name) = toLower(\"Tuberculosis\")\n\
                 RETURN DISTINCT d.drug_name",
    },
    WorkedExample {
        question: "Give me drug smiles that work on inhibitor mechanism of TP53",
        cypher: "MATCH (d:Drug)-[r:TARGETS]->(t:Target)\n\
                 WHERE toLower(t.gene_name) = toLower(\"TP53\")\n\
                 AND toLower(r.drug_mechanism_of_action_on_target) CONTAINS toLower(\"inhibitor\")\n\
                 RETURN DISTINCT d.drug_name, d.drug_smiles",
    },
    WorkedExample {
        question: "Find genes associated with cancer",
        cypher: "MATCH (t:Target)-[:ASSOCIATED_WITH_DISEASE]->(ds:Disease)\n\
                 WHERE toLower(ds.disease_name) CONTAINS toLower(\"cancer\")\n\
                 RETURN DISTINCT t.gene_name",
    },
];

/// The decline phrase without its comment marker, matched case-insensitively.
pub fn decline_phrase() -> &'static str {
    UNABLE_SENTINEL.trim_start_matches('/').trim_start()
}

fn output_rules() -> String {
    format!(
        "## Output format\n\
         - Return ONLY a Cypher query: no comments, explanations, or surrounding text.\n\
         - If the question is unclear or cannot be answered from the schema, return exactly:\n  \
         {UNABLE_SENTINEL}\n\n"
    )
}

const RULES: &str = "\
## Case-insensitive matching
Every comparison on a name property must lowercase both sides:
  WHERE toLower(d.drug_name) = toLower(\"user_input\")
  WHERE toLower(t.gene_name) = toLower(\"user_input\")
  WHERE toLower(ds.disease_name) = toLower(\"user_input\")
  WHERE toLower(p.pathway_name) = toLower(\"user_input\")
  WHERE toLower(b.biomarker_name) = toLower(\"user_input\")

## Mechanism of action
When the question mentions a mechanism, inhibitor, activator, or similar term:
  WHERE toLower(r.drug_mechanism_of_action_on_target) CONTAINS toLower(\"term\")

## Query shape
- \"drugs for X\" or \"treatments for X\": drugs that treat disease X.
- \"genes for X\": targets associated with disease X.
- \"pathways for X\": pathways of targets associated with disease X.
- Use DISTINCT whenever more than one path can produce the same row.
- Filter in WHERE clauses; never match properties inline inside node patterns.
- Use the exact property names from the schema.

## Returned fields
Return only the fields the question needs:
- d.drug_name whenever drugs are requested.
- ds.disease_name whenever diseases are requested.
- r.drug_mechanism_of_action_on_target only when the question mentions a mechanism, inhibition, or activation.
- d.drug_smiles only when SMILES are explicitly requested.
- t.gene_name, t.target_name, p.pathway_name only when genes, targets, or pathways are referenced.
Do not add extra columns.
";

/// Build the fixed system instruction for the given schema.
pub fn system_prompt(schema: &SchemaDescriptor) -> String {
    let mut prompt = String::from(
        "# Cypher Query Assistant for a Neo4j Biomedical Knowledge Graph\n\n\
         You convert natural language questions into valid Cypher queries. \
         Follow these rules strictly.\n\n## Schema\n",
    );
    prompt.push_str(&schema.describe());
    prompt.push('\n');
    prompt.push_str(&output_rules());
    prompt.push_str(RULES);
    prompt.push_str("\n## Examples\n");
    for example in WORKED_EXAMPLES {
        prompt.push_str(&format!(
            "\nQ: {}\n```cypher\n{}\n```\n",
            example.question, example.cypher
        ));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use biograph_core::SCHEMA;

    #[test]
    fn test_prompt_embeds_schema_rules_and_examples() {
        let prompt = system_prompt(&SCHEMA);
        assert!(prompt.contains("- Disease (disease_name)"));
        assert!(prompt.contains("(d:Drug)-[:HAS_BIOMARKER]->(b:Biomarker)"));
        assert!(prompt.contains(&format!("return exactly:\n  {UNABLE_SENTINEL}\n")));
        assert!(prompt.contains("DISTINCT"));
        for example in WORKED_EXAMPLES {
            assert!(prompt.contains(example.question));
            assert!(prompt.contains(example.cypher));
        }
    }

    #[test]
    fn test_decline_phrase_derives_from_sentinel() {
        assert_eq!(decline_phrase(), "unable to generate query");
        assert!(UNABLE_SENTINEL.ends_with(decline_phrase()));
    }

    #[test]
    fn test_examples_use_where_filters_not_inline_properties() {
        for example in WORKED_EXAMPLES {
            assert!(example.cypher.contains("WHERE toLower("));
            assert!(!example.cypher.contains("_name:"), "{}", example.question);
            assert!(example.cypher.contains("RETURN DISTINCT"));
        }
    }
}
