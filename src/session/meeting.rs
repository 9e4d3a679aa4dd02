//! A single meeting session - emotion timeline plus owned artifacts

use super::artifacts::{ArtifactKind, ArtifactSet, ReleaseOutcome};
use super::{
    EmotionReading, ReportData, ReportInput, SessionError, SessionState, SessionSummary,
    TimelineEntry,
};
use crate::emotion::{normalize_label, sanitize_confidence};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// In-memory record of one tracked meeting
#[derive(Debug)]
pub struct Session {
    id: String,
    state: SessionState,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,

    /// Monotonic anchors for elapsed-time computation
    started: Instant,
    ended: Option<Instant>,

    /// Readings in arrival order
    readings: Vec<EmotionReading>,

    artifacts: ArtifactSet,

    /// Remove emptied face-crop directories during cleanup
    prune_empty_dirs: bool,
}

impl Session {
    /// Create a new active session
    pub fn new() -> Self {
        let started_at = Utc::now();
        Self {
            id: generate_session_id(started_at),
            state: SessionState::Active,
            started_at,
            ended_at: None,
            started: Instant::now(),
            ended: None,
            readings: Vec::new(),
            artifacts: ArtifactSet::new(),
            prune_empty_dirs: true,
        }
    }

    pub fn with_pruning(mut self, enabled: bool) -> Self {
        self.prune_empty_dirs = enabled;
        self
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn readings(&self) -> &[EmotionReading] {
        &self.readings
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Append a reading. Ignored once the session has ended.
    pub fn record(
        &mut self,
        label: impl Into<String>,
        confidence: Option<f32>,
        source_image: Option<PathBuf>,
        derived_artifact: Option<PathBuf>,
    ) {
        if !self.is_active() {
            tracing::debug!("Ignoring late reading for ended session {}", self.id);
            return;
        }

        if let Some(path) = &source_image {
            self.artifacts.track(path.clone(), ArtifactKind::Screenshot);
        }
        if let Some(path) = &derived_artifact {
            self.artifacts.track(path.clone(), ArtifactKind::FaceCrop);
        }

        let reading = EmotionReading {
            timestamp: Utc::now(),
            elapsed: self.started.elapsed(),
            label: label.into(),
            confidence: sanitize_confidence(confidence),
            source_image,
            derived_artifact,
        };

        tracing::debug!(
            "Session {}: recorded '{}' at {:.1} minutes",
            self.id,
            reading.label,
            reading.elapsed.as_secs_f64() / 60.0
        );

        self.readings.push(reading);
    }

    /// Mark the session as ended
    pub fn end(&mut self) -> Result<(), SessionError> {
        if !self.is_active() {
            return Err(SessionError::AlreadyEnded {
                id: self.id.clone(),
            });
        }

        self.ended_at = Some(Utc::now());
        self.ended = Some(Instant::now());
        self.state = SessionState::Ended;

        tracing::info!(
            "Session {} ended after {:.1} minutes",
            self.id,
            self.duration_secs() / 60.0
        );

        Ok(())
    }

    /// Register a generated report.
    ///
    /// Reports are the one artifact kind accepted after the session has
    /// ended. They are tracked as preserved and never deleted by cleanup.
    pub fn track_report(&mut self, path: impl AsRef<Path>) {
        let added = self
            .artifacts
            .track(path.as_ref().to_path_buf(), ArtifactKind::Report);
        if added {
            tracing::debug!("Session {} tracks report {:?}", self.id, path.as_ref());
        }
    }

    /// Seconds from start to end, or to now while still active
    pub fn duration_secs(&self) -> f64 {
        let until = self.ended.unwrap_or_else(Instant::now);
        until.saturating_duration_since(self.started).as_secs_f64()
    }

    /// Normalized label frequencies
    pub fn frequencies(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for reading in &self.readings {
            *counts.entry(normalize_label(&reading.label)).or_insert(0) += 1;
        }
        counts
    }

    pub fn summarize(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            state: self.state,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_secs: self.duration_secs(),
            reading_count: self.readings.len(),
            frequencies: self.frequencies(),
            artifact_count: self.artifacts.len(),
        }
    }

    pub fn build_report_input(&self) -> ReportInput {
        if self.readings.is_empty() {
            return ReportInput::Empty {
                session_id: self.id.clone(),
                started_at: self.started_at,
                ended_at: self.ended_at,
            };
        }

        let timeline = self
            .readings
            .iter()
            .map(|r| TimelineEntry {
                elapsed_secs: r.elapsed.as_secs_f64(),
                timestamp: r.timestamp,
                label: r.label.clone(),
                confidence: r.confidence,
            })
            .collect();

        ReportInput::Timeline(ReportData {
            session_id: self.id.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_secs: self.duration_secs(),
            timeline,
            frequencies: self.frequencies(),
        })
    }

    /// Delete owned screenshots and crops, best effort. Safe to repeat.
    pub fn release_artifacts(&mut self) -> ReleaseOutcome {
        let outcome = self.artifacts.release(self.prune_empty_dirs);

        tracing::info!(
            "Session {} cleanup: {} deleted, {} already gone, {} preserved, {} failed",
            self.id,
            outcome.deleted,
            outcome.already_gone,
            outcome.preserved,
            outcome.failed.len()
        );

        outcome
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// `meeting_<date>_<time>_<8 hex>`: readable and collision-free within a process
fn generate_session_id(now: DateTime<Utc>) -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!("meeting_{}_{}", now.format("%Y%m%d_%H%M%S"), &entropy[..8])
}
