//! Configuration management

use crate::report::ReportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub faces: FacesConfig,
    pub classifier: ClassifierConfig,
    pub report: ReportConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Largest accepted screenshot upload
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Session lifecycle policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Start a session implicitly on the first reading.
    /// When false, uploads without an explicit start are rejected.
    pub auto_start: bool,

    /// Remove face-crop directories once cleanup leaves them empty
    pub prune_empty_dirs: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            prune_empty_dirs: true,
        }
    }
}

/// Where uploads, crops and reports live
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Screenshot directory (defaults to the user data dir)
    pub upload_dir: Option<PathBuf>,

    /// Subdirectory of `upload_dir` for face crops
    pub derived_subdir: Option<String>,

    /// Report directory (defaults to the user data dir)
    pub report_dir: Option<PathBuf>,
}

/// Face cropping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacesConfig {
    /// Extra margin around each face, as a fraction of its size
    pub padding: f32,

    /// Most faces classified per screenshot
    pub max_faces: usize,
}

impl Default for FacesConfig {
    fn default() -> Self {
        Self {
            padding: 0.2,
            max_faces: 4,
        }
    }
}

/// Emotion classifier endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inference endpoint; every face is `unknown` when unset
    pub endpoint: Option<String>,

    pub api_token: Option<String>,

    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            timeout_secs: 30,
        }
    }
}

/// Report generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,

    /// `generateContent` endpoint; when set, reports are LLM summaries
    pub summary_endpoint: Option<String>,

    pub summary_api_key: Option<String>,

    pub timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Html,
            summary_endpoint: None,
            summary_api_key: None,
            timeout_secs: 30,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ReportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a file, or return defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config {:?}", path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodlink")
            .join("config.toml")
    }

    /// Base directory for uploads and reports
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("moodlink")
    }

    /// Directory for raw screenshots
    pub fn upload_dir(&self) -> PathBuf {
        self.storage
            .upload_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("uploads"))
    }

    /// Directory for face crops
    pub fn derived_dir(&self) -> PathBuf {
        let subdir = self.storage.derived_subdir.as_deref().unwrap_or("Sanitized");
        self.upload_dir().join(subdir)
    }

    /// Directory for generated reports
    pub fn report_dir(&self) -> PathBuf {
        self.storage
            .report_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("reports"))
    }

    /// `host:port` the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
