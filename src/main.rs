use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rapport::{cli, config, server};

#[derive(Parser)]
#[command(name = "rapport", version, about = "Emotional memory engine for companion chat backends")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Check configuration and backing services
    Doctor,
    /// Classify one line of text and print the emotion reading
    Classify {
        /// Text to classify
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::RapportConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config).await?;
        }
        Command::Classify { text } => {
            cli::classify(&config, &text).await?;
        }
    }

    Ok(())
}
