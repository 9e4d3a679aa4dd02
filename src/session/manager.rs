//! Session manager - owns the single active session and its lifecycle
//!
//! Every compound operation on the current session (start, implicit start,
//! record, end, abort) runs under one write lock. Report rendering and file
//! cleanup happen after the session has been detached and the lock released,
//! so a slow report never blocks status polling or new uploads.

use super::artifacts::ReleaseOutcome;
use super::meeting::Session;
use super::{SessionError, SessionSummary};
use crate::config::Config;
use crate::emotion::Classification;
use crate::protocol::routes;
use crate::report::ReportGenerator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// What happened to the report at session end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReportOutcome {
    /// Document rendered. `file_name` and `url` are set when it was written
    /// to the report directory; `url` is the `GET /reports/<name>` path.
    Rendered {
        file_name: Option<String>,
        url: Option<String>,
        content: String,
    },
    /// Generator failed; `content` is a placeholder summary
    Degraded { content: String },
}

impl ReportOutcome {
    pub fn file_name(&self) -> Option<&str> {
        match self {
            ReportOutcome::Rendered { file_name, .. } => file_name.as_deref(),
            ReportOutcome::Degraded { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ReportOutcome::Rendered { url, .. } => url.as_deref(),
            ReportOutcome::Degraded { .. } => None,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ReportOutcome::Rendered { content, .. } | ReportOutcome::Degraded { content } => {
                content
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ReportOutcome::Degraded { .. })
    }
}

/// Result of a normal session end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Summary taken before cleanup
    pub summary: SessionSummary,
    pub report: ReportOutcome,
    pub release: ReleaseOutcome,
}

/// Result of an aborted session (no report)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbortOutcome {
    pub summary: SessionSummary,
    pub release: ReleaseOutcome,
}

/// Owns at most one active session
pub struct SessionManager {
    /// The active session, if any
    current: RwLock<Option<Session>>,

    /// Renders end-of-session reports
    reports: Arc<dyn ReportGenerator>,

    /// Where rendered reports are written
    report_dir: PathBuf,

    /// Start a session implicitly on the first reading
    auto_start: bool,

    /// Remove emptied face-crop directories during cleanup
    prune_empty_dirs: bool,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(reports: Arc<dyn ReportGenerator>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            current: RwLock::new(None),
            reports,
            report_dir: report_dir.into(),
            auto_start: true,
            prune_empty_dirs: true,
        }
    }

    /// Build a manager from loaded configuration
    pub fn from_config(config: &Config, reports: Arc<dyn ReportGenerator>) -> Self {
        Self::new(reports, config.report_dir())
            .with_auto_start(config.session.auto_start)
            .with_pruning(config.session.prune_empty_dirs)
    }

    pub fn with_auto_start(mut self, enabled: bool) -> Self {
        self.auto_start = enabled;
        self
    }

    pub fn with_pruning(mut self, enabled: bool) -> Self {
        self.prune_empty_dirs = enabled;
        self
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Start a new session, finalizing any session that is still active.
    /// Returns the new session ID.
    pub async fn start(&self) -> String {
        let (id, previous) = {
            let mut current = self.current.write().await;
            let session = self.new_session();
            let id = session.id().to_string();
            let previous = current.replace(session).map(detach);
            (id, previous)
        };

        tracing::info!("Started new meeting session: {}", id);

        if let Some(previous) = previous {
            tracing::info!("Force-ending previous session {}", previous.id());
            let outcome = self.finish(previous).await;
            tracing::info!(
                "Previous session {} finalized: {} readings, {} files deleted, report {}",
                outcome.summary.session_id,
                outcome.summary.reading_count,
                outcome.release.deleted,
                if outcome.report.is_degraded() {
                    "degraded"
                } else {
                    "rendered"
                }
            );
        }

        id
    }

    /// Record a reading against the current session. Starts a session first
    /// when none is active and auto-start is enabled. Returns the ID of the
    /// session that received the reading.
    pub async fn record_emotion(
        &self,
        label: impl Into<String>,
        confidence: Option<f32>,
        source_image: Option<PathBuf>,
        derived_artifact: Option<PathBuf>,
    ) -> Result<String, SessionError> {
        let mut current = self.current.write().await;
        let session = self.current_or_start(&mut current)?;

        session.record(label, confidence, source_image, derived_artifact);
        Ok(session.id().to_string())
    }

    /// Record every reading taken from one screenshot in a single critical
    /// section, so they all land in the same session. Each entry pairs a
    /// classification with the face crop it came from, if any.
    pub async fn record_batch(
        &self,
        source_image: &Path,
        readings: Vec<(Classification, Option<PathBuf>)>,
    ) -> Result<String, SessionError> {
        let mut current = self.current.write().await;
        let session = self.current_or_start(&mut current)?;

        for (classification, derived_artifact) in readings {
            session.record(
                classification.label,
                classification.confidence,
                Some(source_image.to_path_buf()),
                derived_artifact,
            );
        }
        Ok(session.id().to_string())
    }

    /// End the current session: report, cleanup, reset
    pub async fn end(&self) -> Result<SessionOutcome, SessionError> {
        let session = {
            let mut current = self.current.write().await;
            current.take().map(detach)
        }
        .ok_or(SessionError::NoActiveSession)?;

        Ok(self.finish(session).await)
    }

    /// Drop the current session and delete its files without a report
    pub async fn abort(&self) -> Option<AbortOutcome> {
        let mut session = {
            let mut current = self.current.write().await;
            current.take().map(detach)
        }?;

        tracing::warn!("Aborting session {} without a report", session.id());

        let summary = session.summarize();
        let release = session.release_artifacts();
        Some(AbortOutcome { summary, release })
    }

    /// Snapshot of the current session, if any
    pub async fn status(&self) -> Option<SessionSummary> {
        self.current.read().await.as_ref().map(Session::summarize)
    }

    pub async fn is_active(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// The active session, implicitly started when auto-start is enabled
    fn current_or_start<'a>(
        &self,
        current: &'a mut Option<Session>,
    ) -> Result<&'a mut Session, SessionError> {
        if current.is_none() {
            if !self.auto_start {
                return Err(SessionError::NoActiveSession);
            }
            let session = self.new_session();
            tracing::info!("Implicitly started meeting session: {}", session.id());
            *current = Some(session);
        }
        current.as_mut().ok_or(SessionError::NoActiveSession)
    }

    fn new_session(&self) -> Session {
        Session::new().with_pruning(self.prune_empty_dirs)
    }

    /// Report and cleanup for a session that is already detached and ended
    async fn finish(&self, mut session: Session) -> SessionOutcome {
        let summary = session.summarize();
        let input = session.build_report_input();

        let report = match self.reports.render(&input).await {
            Ok(content) => {
                let file_name = match self.persist_report(session.id(), &content).await {
                    Ok((path, file_name)) => {
                        session.track_report(&path);
                        Some(file_name)
                    }
                    Err(e) => {
                        tracing::warn!("Failed to save report for {}: {:#}", session.id(), e);
                        None
                    }
                };
                let url = file_name
                    .as_ref()
                    .map(|name| format!("{}/{}", routes::REPORTS, name));
                ReportOutcome::Rendered {
                    file_name,
                    url,
                    content,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Report generator '{}' failed for {}: {:#}",
                    self.reports.name(),
                    session.id(),
                    e
                );
                ReportOutcome::Degraded {
                    content: format!("Report generation failed: {:#}", e),
                }
            }
        };

        let release = session.release_artifacts();

        SessionOutcome {
            summary,
            report,
            release,
        }
    }

    /// Write the report; returns its full path and bare file name
    async fn persist_report(
        &self,
        session_id: &str,
        content: &str,
    ) -> anyhow::Result<(PathBuf, String)> {
        tokio::fs::create_dir_all(&self.report_dir).await?;
        let file_name = format!(
            "meeting_report_{}.{}",
            session_id,
            self.reports.format().extension()
        );
        let path = self.report_dir.join(&file_name);
        tokio::fs::write(&path, content).await?;
        tracing::info!("Meeting report saved to: {:?}", path);
        Ok((path, file_name))
    }
}

/// Mark a session taken out of the manager as ended
fn detach(mut session: Session) -> Session {
    if let Err(e) = session.end() {
        tracing::warn!("{}", e);
    }
    session
}
