//! TCP listener, collaborator wiring and server main loop

use super::handlers::{create_router, AppContext};
use crate::config::Config;
use crate::emotion::{EmotionSource, HttpEmotionSource, NullEmotionSource};
use crate::faces::{CroppingExtractor, FaceExtractor, NoFaceDetector};
use crate::pipeline::{ArtifactStore, Ingestor};
use crate::report::{
    HtmlReportGenerator, RemoteSummaryGenerator, ReportFormat, ReportGenerator,
    TextReportGenerator,
};
use crate::session::SessionManager;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Wire collaborators from configuration into an application context
pub fn build_context(config: &Config) -> Result<AppContext> {
    let reports: Arc<dyn ReportGenerator> = match &config.report.summary_endpoint {
        Some(endpoint) => Arc::new(RemoteSummaryGenerator::new(
            endpoint.clone(),
            config.report.summary_api_key.clone(),
            config.report.timeout(),
        )?),
        None => match config.report.format {
            ReportFormat::Html => Arc::new(HtmlReportGenerator::new()),
            ReportFormat::Text => Arc::new(TextReportGenerator::new()),
        },
    };

    let source: Arc<dyn EmotionSource> = match &config.classifier.endpoint {
        Some(endpoint) => Arc::new(HttpEmotionSource::new(
            endpoint.clone(),
            config.classifier.api_token.clone(),
            config.classifier.timeout(),
        )?),
        None => {
            tracing::warn!("No classifier endpoint configured; every reading will be 'unknown'");
            Arc::new(NullEmotionSource)
        }
    };

    let extractor: Arc<dyn FaceExtractor> = Arc::new(
        CroppingExtractor::new(NoFaceDetector)
            .with_padding(config.faces.padding)
            .with_max_faces(config.faces.max_faces),
    );

    tracing::info!(
        "Collaborators: report={}, classifier={}, auto_start={}",
        reports.name(),
        source.name(),
        config.session.auto_start
    );

    let manager = Arc::new(SessionManager::from_config(config, reports));
    let store = ArtifactStore::new(config.upload_dir(), config.derived_dir());
    let ingestor = Arc::new(Ingestor::new(manager, extractor, source, store));

    Ok(AppContext::new(ingestor, config.server.max_upload_bytes))
}

/// HTTP server listener
pub struct ServerListener {
    addr: String,
    ctx: AppContext,
}

impl ServerListener {
    /// Create a listener from configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            addr: config.bind_addr(),
            ctx: build_context(config)?,
        })
    }

    /// Create a listener around an existing context
    pub fn with_context(addr: impl Into<String>, ctx: AppContext) -> Self {
        Self {
            addr: addr.into(),
            ctx,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(&self, shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("Failed to bind to {}", self.addr))?;
        self.serve(listener, shutdown_rx).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let local: SocketAddr = listener.local_addr()?;
        tracing::info!("Server listening on http://{}", local);

        let app = create_router(self.ctx.clone());
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await
            .context("Server error")?;

        self.cleanup().await;

        Ok(())
    }

    /// Close out a session left open at shutdown
    async fn cleanup(&self) {
        tracing::info!("Cleaning up server resources");

        if self.ctx.manager.is_active().await {
            match self.ctx.manager.end().await {
                Ok(outcome) => tracing::info!(
                    "Ended session {} at shutdown ({} files deleted)",
                    outcome.summary.session_id,
                    outcome.release.deleted
                ),
                Err(e) => tracing::warn!("Failed to end session at shutdown: {}", e),
            }
        }
    }
}
