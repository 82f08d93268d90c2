//! cyberclaw CLI — the main entry point.
//!
//! Commands:
//! - `chat`  — Interactive session or single-message mode
//! - `tools` — Show the aggregated tool catalog from configured servers

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "cyberclaw",
    about = "cyberclaw — AI security assistant over MCP tool servers",
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
    /// Chat with the security assistant
    Chat {
        /// Initial agent mode (base, redteam, blueteam, desktopsecurity,
        /// webpentest, osint, smartcontract)
        #[arg(long, default_value = "base")]
        mode: String,

        /// Provider backend (anthropic, openai, gemini, ollama, zai)
        #[arg(long)]
        provider: Option<String>,

        /// Model identifier (defaults to the provider's default)
        #[arg(long)]
        model: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List the tools exported by the configured MCP servers
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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
        Commands::Chat {
            mode,
            provider,
            model,
            message,
        } => commands::chat::run(mode, provider, model, message).await?,
        Commands::Tools => commands::tools::run().await?,
    }

    Ok(())
}
