mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use hippograph::config::HippoConfig;
use hippograph::memory::episodes::SearchEventsRequest;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hippograph", version, about = "Episodic memory graph MCP server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to serve on (defaults to [server] transport in config)
        #[arg(long, value_enum)]
        transport: Option<Transport>,
    },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Rank memories by similarity and significance
    Recall {
        /// Natural-language query; omit to rank by significance
        query: Option<String>,
        #[arg(long)]
        min_significance: Option<f64>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Reconstruct episodes from partial cues
    Search {
        /// Semantic cue
        query: Option<String>,
        /// Person name or agent id (repeatable)
        #[arg(long = "participant")]
        participants: Vec<String>,
        /// Entity id (repeatable)
        #[arg(long = "entity")]
        entities: Vec<String>,
        #[arg(long)]
        place: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show a bond and its history
    Bond { from: String, to: String },
    /// Show graph statistics and health
    Stats,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.hippograph/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = HippoConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or(match config.server.transport.as_str() {
                "http" => Transport::Http,
                _ => Transport::Stdio,
            });
            match transport {
                Transport::Stdio => server::serve_stdio(config).await?,
                Transport::Http => server::serve_http(config).await?,
            }
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
        Command::Recall {
            query,
            min_significance,
            limit,
        } => {
            cli::recall::recall(&config, query, min_significance, limit).await?;
        }
        Command::Search {
            query,
            participants,
            entities,
            place,
            limit,
        } => {
            let req = SearchEventsRequest {
                semantic_query: query,
                participants,
                entities,
                place,
                limit,
                ..Default::default()
            };
            cli::search::search(&config, req).await?;
        }
        Command::Bond { from, to } => {
            cli::bond::bond(&config, &from, &to).await?;
        }
        Command::Stats => {
            cli::stats::stats(&config)?;
        }
    }

    Ok(())
}
