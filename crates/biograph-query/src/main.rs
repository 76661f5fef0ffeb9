//! CLI entry point for asking the Biograph knowledge graph a question.
//!
//! Prints the presentation result on stdout; diagnostics go to stderr.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use biograph_core::BiographConfig;
use biograph_graph::{GraphConfig, LazyGraphClient};
use biograph_query::{OpenAiCompatClient, QueryPipeline};

#[derive(Parser)]
#[command(name = "biograph-ask")]
#[command(about = "Answer a biomedical question from the Biograph knowledge graph")]
struct Cli {
    /// The question, e.g. "What are the drugs for Tuberculosis?".
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,

    /// Config file prefix (default: biograph).
    #[arg(short, long, default_value = "biograph")]
    config: String,

    /// Print the full outcome as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,

    /// Stop after resolution and print the query that would run.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let config = BiographConfig::load(&cli.config)?;
    let question = cli.question.join(" ");

    let completion = OpenAiCompatClient::new(&config.completion);
    let store = LazyGraphClient::new(GraphConfig::from(&config.neo4j));
    let pipeline = QueryPipeline::from_config(&config, completion, store);

    if cli.dry_run {
        let plan = pipeline.plan(&question).await;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            println!("Question: {}", plan.question.normalized());
            println!("Triggers: {:?}", plan.resolution.triggers);
            println!("\n{}", plan.resolution.final_query);
        }
        return Ok(());
    }

    let outcome = pipeline.ask(&question).await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.result);
    }

    if outcome.result.is_error() {
        std::process::exit(1);
    }
    Ok(())
}
