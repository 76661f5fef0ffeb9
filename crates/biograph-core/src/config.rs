//! Configuration management for Biograph.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (BIOGRAPH_ prefix, `__` section separator)
//! 2. Config file (biograph.toml)
//! 3. Well-known backend variables (OPENAI_API_KEY, NEO4J_URI, NEO4J_USER, NEO4J_PASSWORD)
//! 4. Defaults

use serde::Deserialize;

use crate::error::Result;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BiographConfig {
    #[serde(default)]
    pub completion: CompletionSettings,

    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub export: ExportSettings,

    #[serde(default)]
    pub resolver: ResolverSettings,
}

/// OpenAI-compatible text-completion endpoint used for query synthesis.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer token. Falls back to `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_neo4j_uri")]
    pub uri: String,

    #[serde(default = "default_neo4j_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    #[serde(default = "default_query_timeout")]
    pub timeout_secs: u64,
}

/// Where and how result workbooks are written.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_export_dir")]
    pub dir: String,

    /// Key the workbook file name by request id. When false every run
    /// overwrites `results.xlsx`.
    #[serde(default = "default_true")]
    pub per_request: bool,

    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

/// Fallback resolver switches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverSettings {
    /// Also fall back when a `*_name` comparison skips `toLower(...)`.
    #[serde(default)]
    pub strict_name_matching: bool,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_completion_timeout() -> u64 {
    60
}

fn default_neo4j_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    4
}

fn default_fetch_size() -> usize {
    256
}

fn default_query_timeout() -> u64 {
    30
}

fn default_export_dir() -> String {
    ".".to_string()
}

fn default_preview_rows() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: default_completion_timeout(),
        }
    }
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_neo4j_uri(),
            user: default_neo4j_user(),
            password: String::new(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
            timeout_secs: default_query_timeout(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            per_request: true,
            preview_rows: default_preview_rows(),
        }
    }
}

impl BiographConfig {
    /// Load configuration from `{file_prefix}.toml` (optional) and the environment.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = ::config::Config::builder()
            .add_source(::config::File::with_name(file_prefix).required(false))
            .add_source(
                ::config::Environment::with_prefix("BIOGRAPH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut loaded: Self = cfg.try_deserialize()?;
        loaded.apply_backend_env(|key| std::env::var(key).ok());
        Ok(loaded)
    }

    /// Fill unset credentials from the conventional backend variables.
    fn apply_backend_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.completion.api_key.is_none() {
            self.completion.api_key = lookup("OPENAI_API_KEY");
        }
        if self.neo4j.password.is_empty() {
            if let Some(password) = lookup("NEO4J_PASSWORD") {
                self.neo4j.password = password;
            }
        }
        if self.neo4j.uri == default_neo4j_uri() {
            if let Some(uri) = lookup("NEO4J_URI") {
                self.neo4j.uri = uri;
            }
        }
        if self.neo4j.user == default_neo4j_user() {
            if let Some(user) = lookup("NEO4J_USER") {
                self.neo4j.user = user;
            }
        }
    }
}
