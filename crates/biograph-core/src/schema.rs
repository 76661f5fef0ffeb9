//! Static description of the biomedical knowledge graph.
//!
//! The descriptor is loaded once, never mutated, and shared read-only by the
//! query synthesizer (prompt construction) and the resolver (name-property
//! checks). It mirrors the node and edge tables produced by the upstream
//! normalization job.

use std::fmt::Write as _;

/// A node label with its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeKind {
    pub label: &'static str,
    /// Variable conventionally bound to this label in generated queries.
    pub variable: &'static str,
    pub properties: &'static [&'static str],
}

/// A relationship type with its endpoint labels and optional edge properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipKind {
    pub rel_type: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    pub properties: &'static [&'static str],
}

/// The complete graph schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaDescriptor {
    pub nodes: &'static [NodeKind],
    pub relationships: &'static [RelationshipKind],
}

/// The process-wide schema of the biomedical graph.
pub static SCHEMA: SchemaDescriptor = SchemaDescriptor {
    nodes: &[
        NodeKind {
            label: "Drug",
            variable: "d",
            properties: &["drug_id", "drug_name", "drug_smiles"],
        },
        NodeKind {
            label: "Target",
            variable: "t",
            properties: &["target_id", "target_name", "gene_name"],
        },
        NodeKind {
            label: "Disease",
            variable: "ds",
            properties: &["disease_name"],
        },
        NodeKind {
            label: "Pathway",
            variable: "p",
            properties: &["pathway_name"],
        },
        NodeKind {
            label: "Biomarker",
            variable: "b",
            properties: &["biomarker_name"],
        },
    ],
    relationships: &[
        RelationshipKind {
            rel_type: "TREATS_DISEASE",
            from: "Drug",
            to: "Disease",
            properties: &["approval_status"],
        },
        RelationshipKind {
            rel_type: "TARGETS",
            from: "Drug",
            to: "Target",
            properties: &["drug_mechanism_of_action_on_target"],
        },
        RelationshipKind {
            rel_type: "ASSOCIATED_WITH_DISEASE",
            from: "Target",
            to: "Disease",
            properties: &["approval_status"],
        },
        RelationshipKind {
            rel_type: "INVOLVED_IN_PATHWAY",
            from: "Target",
            to: "Pathway",
            properties: &[],
        },
        RelationshipKind {
            rel_type: "HAS_BIOMARKER",
            from: "Drug",
            to: "Biomarker",
            properties: &[],
        },
    ],
};

impl SchemaDescriptor {
    /// Look up a node kind by label.
    pub fn node(&self, label: &str) -> Option<&NodeKind> {
        self.nodes.iter().find(|n| n.label == label)
    }

    /// All node properties that hold human-readable names (`*_name`).
    ///
    /// Every comparison against one of these must be case-insensitive.
    pub fn name_properties(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.nodes
            .iter()
            .flat_map(|n| n.properties.iter().copied())
            .filter(|p| p.ends_with("_name"))
    }

    /// Render the schema as the node/relationship listing embedded in prompts.
    pub fn describe(&self) -> String {
        let mut out = String::from("Nodes:\n");
        for node in self.nodes {
            let _ = writeln!(out, "- {} ({})", node.label, node.properties.join(", "));
        }

        out.push_str("\nRelationships:\n");
        for rel in self.relationships {
            let from = self.node(rel.from).map_or("n", |n| n.variable);
            let to = self.node(rel.to).map_or("m", |n| n.variable);
            let props = if rel.properties.is_empty() {
                String::new()
            } else {
                format!(" {{{}}}", rel.properties.join(", "))
            };
            let _ = writeln!(
                out,
                "- ({from}:{})-[:{}{props}]->({to}:{})",
                rel.from, rel.rel_type, rel.to
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_endpoints_are_known_labels() {
        for rel in SCHEMA.relationships {
            assert!(SCHEMA.node(rel.from).is_some(), "unknown label {}", rel.from);
            assert!(SCHEMA.node(rel.to).is_some(), "unknown label {}", rel.to);
        }
    }

    #[test]
    fn test_name_properties() {
        let names: Vec<_> = SCHEMA.name_properties().collect();
        assert_eq!(
            names,
            vec![
                "drug_name",
                "target_name",
                "gene_name",
                "disease_name",
                "pathway_name",
                "biomarker_name"
            ]
        );
    }

    #[test]
    fn test_describe_lists_edges_with_properties() {
        let text = SCHEMA.describe();
        assert!(text.contains("- Drug (drug_id, drug_name, drug_smiles)"));
        assert!(text.contains(
            "- (d:Drug)-[:TARGETS {drug_mechanism_of_action_on_target}]->(t:Target)"
        ));
        assert!(text.contains("- (t:Target)-[:INVOLVED_IN_PATHWAY]->(p:Pathway)"));
    }
}
