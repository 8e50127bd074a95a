//! ThreadSage CLI: the main entry point.
//!
//! Commands:
//! - `serve`    : Start the HTTP gateway and Slack dispatch loop
//! - `chat`     : Interactive chat or single-message mode
//! - `learn`    : Append a fact to the knowledge store
//! - `knowledge`: Print the knowledge corpus
//! - `status`   : Show resolved configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "threadsage",
    about = "ThreadSage: a Slack assistant that answers, recalls, and learns",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway (Slack events + JSON API)
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant from the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Store a fact in the knowledge file without classifying it
    Learn {
        /// The text to remember
        text: String,
    },

    /// Print the knowledge corpus
    Knowledge,

    /// Show system status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Learn { text } => commands::learn::run(text).await?,
        Commands::Knowledge => commands::knowledge::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
