//! biograph-core: Shared schema, types, configuration, and error handling for Biograph.
//!
//! This crate provides the foundational pieces used by every stage of the
//! question-to-graph pipeline:
//! - The static Schema Descriptor of the biomedical knowledge graph
//! - Question, candidate/final query, record, and presentation result types
//! - Layered configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use crate::config::BiographConfig;
pub use crate::error::BiographError;
pub use crate::schema::{SchemaDescriptor, SCHEMA};
pub use crate::types::{
    rename_field, CandidateQuery, FinalQuery, PresentationResult, QuerySource, Question, Record,
    RequestId, ResultSet,
};
