//! moodlink-server - HTTP service holding the active meeting session

use anyhow::Result;
use clap::Parser;
use moodlink::config::Config;
use moodlink::server::ServerListener;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "moodlink-server")]
#[command(about = "moodlink meeting emotion tracking server")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Host override
    #[arg(long)]
    host: Option<String>,

    /// Port override
    #[arg(short, long)]
    port: Option<u16>,

    /// Require an explicit session start before uploads are accepted
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.strict {
        config.session.auto_start = false;
    }

    tracing::info!("Uploads in {:?}, reports in {:?}", config.upload_dir(), config.report_dir());

    let server = ServerListener::new(&config)?;
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            // Keep the sender alive so the server is not shut down
            std::future::pending::<()>().await;
        }
        let _ = shutdown_tx.send(()).await;
    });

    server.run(shutdown_rx).await
}
