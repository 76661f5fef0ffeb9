//! Biograph Graph — Neo4j client for the biomedical knowledge graph.
//!
//! The pipeline only reads from the graph. Every question results in exactly
//! one query execution through [`GraphStore::execute_read`], with the
//! connection held for that execution alone.

pub mod client;
pub mod projection;
pub mod store;

pub use client::{check_reachable, GraphClient, GraphConfig, GraphError, Result};
pub use store::{GraphStore, LazyGraphClient};
