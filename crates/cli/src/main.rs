//! Baton CLI: the main entry point.
//!
//! Commands:
//! - `generate`: Generate from text, a template, or an instruction
//! - `chain`   : Run templates in sequence, each seeing the last reply
//! - `docs`    : Add to and query the document store
//! - `config`  : Print the effective or default configuration
//! - `health`  : Check that the generation runtime is reachable

use std::path::PathBuf;

use baton_config::{BatonConfig, LoggingConfig};
use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "baton",
    about = "Baton: compose instructions and orchestrate local LLM generation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of ~/.baton/config.toml
    #[arg(long, global = true, env = "BATON_CONFIG")]
    config: Option<PathBuf>,
}

/// Per-call generation options shared by `generate` and `chain`.
#[derive(Args, Debug, Default)]
pub struct GenerationArgs {
    /// Maximum number of tokens to generate
    #[arg(long)]
    tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Ask the model for JSON output
    #[arg(long)]
    json: bool,

    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Template parameter as key=value (value parsed as JSON when possible)
    #[arg(short, long = "param", value_parser = commands::parse_param)]
    params: Vec<(String, serde_json::Value)>,

    /// Print the whole reply as JSON instead of just its data
    #[arg(long)]
    full: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a reply
    Generate {
        /// The query; a template when any --param is given
        query: String,

        /// Who the model should behave as
        #[arg(long)]
        role: Option<String>,

        /// The tone of the answer
        #[arg(long)]
        tone: Option<String>,

        /// How detailed the answer should be
        #[arg(long)]
        detail: Option<String>,

        /// Literal context for the answer
        #[arg(long)]
        context: Option<String>,

        /// Fill the context with N documents retrieved for the query
        #[arg(long, value_name = "N")]
        inject: Option<usize>,

        /// Offer the shell tool to the model
        #[arg(long)]
        shell: bool,

        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Run a chain of templates; later steps can use {{ reply.data }}
    Chain {
        /// A step template (repeat for each step, in order)
        #[arg(long = "step", required = true)]
        steps: Vec<String>,

        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Manage the document store
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Print configuration as TOML
    Config {
        /// Print the built-in defaults instead of the effective configuration
        #[arg(long)]
        default: bool,

        /// Print the configuration file path and exit
        #[arg(long, conflicts_with = "default")]
        path: bool,
    },

    /// Check that the generation runtime is reachable
    Health,
}

#[derive(Subcommand)]
enum DocsAction {
    /// Add one document per argument
    Add {
        #[arg(required = true)]
        contents: Vec<String>,

        /// Target collection (defaults to the configured one)
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Find the documents most similar to a text
    Query {
        text: String,

        /// Number of results
        #[arg(short = 'n', long)]
        count: Option<usize>,

        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Count the documents in a collection
    Count {
        #[arg(short, long)]
        collection: Option<String>,
    },
}

fn init_tracing(verbose: bool, logging: &LoggingConfig) {
    let filter = if verbose { "debug" } else { logging.filter.as_str() };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BatonConfig::load_with_env(path),
        None => BatonConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;

    init_tracing(cli.verbose, &config.logging);

    match cli.command {
        Commands::Generate {
            query,
            role,
            tone,
            detail,
            context,
            inject,
            shell,
            generation,
        } => {
            let facets = commands::generate::Facets {
                role,
                tone,
                detail,
                context,
                inject,
                shell,
            };
            commands::generate::run(&config, query, facets, generation).await?
        }
        Commands::Chain { steps, generation } => {
            commands::chain::run(&config, steps, generation).await?
        }
        Commands::Docs { action } => match action {
            DocsAction::Add {
                contents,
                collection,
            } => commands::docs::add(&config, contents, collection).await?,
            DocsAction::Query {
                text,
                count,
                collection,
            } => commands::docs::query(&config, &text, count, collection).await?,
            DocsAction::Count { collection } => commands::docs::count(&config, collection).await?,
        },
        Commands::Config { default, path } => {
            commands::config_cmd::run(&config, cli.config.as_deref(), default, path)?
        }
        Commands::Health => commands::health::run(&config).await?,
    }

    Ok(())
}
