//! Artifact store - writes screenshots and face crops to disk

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Names and writes upload artifacts
#[derive(Debug)]
pub struct ArtifactStore {
    upload_dir: PathBuf,
    derived_dir: PathBuf,

    /// Process-wide screenshot counter
    next_id: AtomicU64,
}

impl ArtifactStore {
    pub fn new(upload_dir: impl Into<PathBuf>, derived_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            derived_dir: derived_dir.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn derived_dir(&self) -> &Path {
        &self.derived_dir
    }

    /// Write a screenshot as `screenshot_<n>.png`; returns `n` and the path
    pub async fn save_screenshot(&self, bytes: &[u8]) -> std::io::Result<(u64, PathBuf)> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let path = self.upload_dir.join(format!("screenshot_{}.png", id));

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!("Screenshot {} saved to {:?}", id, path);
        Ok((id, path))
    }

    /// Write face `index` of screenshot `id` as `screenshot_<id>_face_<index>.png`
    pub async fn save_face(&self, id: u64, index: usize, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self
            .derived_dir
            .join(format!("screenshot_{}_face_{}.png", id, index));

        tokio::fs::create_dir_all(&self.derived_dir).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Best-effort removal of files written for a rejected upload
    pub async fn discard(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to discard {:?}: {}", path, e);
                }
            }
        }
    }
}
