//! Message types for the moodlink HTTP API

use crate::pipeline::FaceReading;
use crate::session::{ReleaseOutcome, SessionSummary};
use serde::{Deserialize, Serialize};

/// Response to `POST /readings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingsResponse {
    pub session_id: String,
    pub readings: Vec<FaceReading>,

    /// Session snapshot after the readings were recorded
    pub session: Option<SessionSummary>,
}

/// Response to `GET /session/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub active: bool,
    pub session: Option<SessionSummary>,
}

/// Response to `POST /session/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
}

/// Response to `POST /session/cleanup`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupResponse {
    /// Session that was aborted, if one was active
    pub session: Option<SessionSummary>,
    pub release: ReleaseOutcome,
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response to `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub api_version: u32,
}
