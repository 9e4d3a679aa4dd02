//! Session management - meeting timelines, artifact ownership, lifecycle

mod artifacts;
mod manager;
mod meeting;

pub use artifacts::{ArtifactKind, ArtifactSet, ReleaseFailure, ReleaseOutcome, TrackedArtifact};
pub use manager::{AbortOutcome, ReportOutcome, SessionManager, SessionOutcome};
pub use meeting::Session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Session-level errors surfaced to callers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active session")]
    NoActiveSession,

    #[error("Session '{id}' has already ended")]
    AlreadyEnded { id: String },
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Accepting readings
    Active,
    /// Closed; late readings are ignored
    Ended,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

/// One timestamped emotion classification tied to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    /// Wall-clock time of the reading
    pub timestamp: DateTime<Utc>,

    /// Monotonic time since session start
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,

    pub label: String,

    /// Confidence in [0, 1], absent when the source gave none
    pub confidence: Option<f32>,

    /// Screenshot the reading was taken from
    pub source_image: Option<PathBuf>,

    /// Face crop the classifier actually saw
    pub derived_artifact: Option<PathBuf>,
}

/// Read-only projection of a session, used for status polling and end results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub reading_count: usize,

    /// Normalized label -> number of readings
    pub frequencies: BTreeMap<String, usize>,

    /// Number of artifact paths the session tracks
    pub artifact_count: usize,
}

/// One entry of a report timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub elapsed_secs: f64,
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub confidence: Option<f32>,
}

/// Aggregated data handed to a report generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub timeline: Vec<TimelineEntry>,
    pub frequencies: BTreeMap<String, usize>,
}

/// Report generator input; `Empty` when the session collected no readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportInput {
    Empty {
        session_id: String,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    },
    Timeline(ReportData),
}

impl ReportInput {
    pub fn session_id(&self) -> &str {
        match self {
            ReportInput::Empty { session_id, .. } => session_id,
            ReportInput::Timeline(data) => &data.session_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ReportInput::Empty { .. })
    }
}

/// Serialize a `Duration` as whole milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
