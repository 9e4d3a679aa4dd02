//! Protocol definitions for the HTTP API shared by server and client
//!
//! All bodies are JSON. `POST /session/end` answers with
//! [`SessionOutcome`](crate::session::SessionOutcome) directly.

mod message;

pub use message::{
    CleanupResponse, ErrorResponse, HealthResponse, ReadingsResponse, StartResponse,
    StatusResponse,
};

/// API version for compatibility checking
pub const API_VERSION: u32 = 1;

/// Route paths
pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const READINGS: &str = "/readings";
    pub const SESSION_START: &str = "/session/start";
    pub const SESSION_END: &str = "/session/end";
    pub const SESSION_STATUS: &str = "/session/status";
    pub const SESSION_CLEANUP: &str = "/session/cleanup";
    pub const REPORTS: &str = "/reports";
}

/// Check that a report file name is a bare name that cannot escape the
/// report directory
pub fn is_safe_report_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}
