//! Artifact tracking - files a session owns and must clean up

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// What kind of file an artifact is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Raw uploaded screenshot
    Screenshot,
    /// Cropped face image fed to the classifier
    FaceCrop,
    /// Generated report document (never deleted)
    Report,
}

impl ArtifactKind {
    pub fn is_preserved(&self) -> bool {
        matches!(self, ArtifactKind::Report)
    }
}

/// A path owned by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

/// A deletion that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of one cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseOutcome {
    /// Files actually removed by this pass
    pub deleted: usize,

    /// Files that were already gone
    pub already_gone: usize,

    /// Files kept on purpose (reports)
    pub preserved: usize,

    pub failed: Vec<ReleaseFailure>,
}

impl ReleaseOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered, duplicate-free set of artifact paths
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    entries: Vec<TrackedArtifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path. Returns false if the path was already tracked.
    pub fn track(&mut self, path: impl Into<PathBuf>, kind: ArtifactKind) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.entries.push(TrackedArtifact { path, kind });
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|a| a.path == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedArtifact> {
        self.entries.iter()
    }

    /// Delete every non-preserved artifact, best effort.
    ///
    /// Deleted and already-missing paths are dropped from the set so a later
    /// pass never touches them again; failed paths stay tracked. When
    /// `prune_empty_dirs` is set, directories that held face crops are
    /// removed once they are empty.
    pub fn release(&mut self, prune_empty_dirs: bool) -> ReleaseOutcome {
        let mut outcome = ReleaseOutcome::default();
        let mut crop_dirs = BTreeSet::new();

        self.entries.retain(|artifact| {
            if artifact.kind.is_preserved() {
                outcome.preserved += 1;
                return true;
            }

            match std::fs::remove_file(&artifact.path) {
                Ok(()) => {
                    tracing::debug!("Deleted artifact {:?}", artifact.path);
                    outcome.deleted += 1;
                    if artifact.kind == ArtifactKind::FaceCrop {
                        if let Some(parent) = artifact.path.parent() {
                            crop_dirs.insert(parent.to_path_buf());
                        }
                    }
                    false
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("Artifact already gone: {:?}", artifact.path);
                    outcome.already_gone += 1;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to delete artifact {:?}: {}", artifact.path, e);
                    outcome.failed.push(ReleaseFailure {
                        path: artifact.path.clone(),
                        reason: e.to_string(),
                    });
                    true
                }
            }
        });

        if prune_empty_dirs {
            for dir in crop_dirs {
                prune_if_empty(&dir);
            }
        }

        outcome
    }
}

/// Remove a directory if it has no entries left
fn prune_if_empty(dir: &Path) {
    let is_empty = match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => return,
    };

    if is_empty {
        match std::fs::remove_dir(dir) {
            Ok(()) => tracing::debug!("Removed empty directory {:?}", dir),
            Err(e) => tracing::warn!("Failed to remove empty directory {:?}: {}", dir, e),
        }
    }
}
