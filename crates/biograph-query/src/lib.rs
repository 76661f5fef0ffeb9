//! biograph-query: Natural-language questions answered from the Biograph knowledge graph.
//!
//! Each question flows strictly forward through three stages:
//! synthesize a Cypher query with a text-completion service, resolve it
//! (substituting a broad fallback template when the synthesis looks
//! unreliable), then execute it once and normalize the rows for
//! presentation and workbook export.

pub mod completion;
pub mod error;
pub mod execute;
pub mod export;
pub mod pipeline;
pub mod preview;
pub mod prompt;
pub mod resolve;
pub mod synthesize;

pub use completion::{CompletionRequest, CompletionService, OpenAiCompatClient};
pub use error::{ExportError, SynthesisError};
pub use execute::Executor;
pub use pipeline::{PipelineOutcome, QueryPipeline, QueryPlan};
pub use resolve::{FallbackResolver, FallbackTrigger, Resolution};
pub use synthesize::QuerySynthesizer;
