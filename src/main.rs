//! moodlink - command-line client for a running moodlink server

use anyhow::Result;
use clap::{Parser, Subcommand};
use moodlink::client::{self, ApiClient};
use moodlink::config::Config;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "moodlink")]
#[command(about = "Meeting emotion tracker client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server URL (defaults to the configured host and port)
    #[arg(short, long)]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current session
    Status,
    /// Start a new session, ending the current one
    Start,
    /// End the current session and generate its report
    End,
    /// Abort the current session and delete its files without a report
    Cleanup,
    /// Upload a screenshot
    Upload {
        /// Image file
        file: PathBuf,
    },
    /// Print a saved report
    Report {
        /// Report file name
        name: String,
    },
    /// Check that the server is up
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let server = cli
        .server
        .unwrap_or_else(|| format!("http://{}", config.bind_addr()));
    let api = ApiClient::new(server, Duration::from_secs(config.report.timeout_secs + 30))?;

    match cli.command {
        Some(Commands::Status) | None => client::show_status(&api).await,
        Some(Commands::Start) => client::start_session(&api).await,
        Some(Commands::End) => client::end_session(&api).await,
        Some(Commands::Cleanup) => client::cleanup(&api).await,
        Some(Commands::Upload { file }) => client::upload_file(&api, &file).await,
        Some(Commands::Report { name }) => client::show_report(&api, &name).await,
        Some(Commands::Health) => {
            let health = api.health().await?;
            println!(
                "{} (version {}, api {})",
                health.status, health.version, health.api_version
            );
            Ok(())
        }
    }
}
