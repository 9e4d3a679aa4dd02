//! Ingestion pipeline - screenshot -> faces -> classifications -> session

mod store;

pub use store::ArtifactStore;

use crate::emotion::{Classification, EmotionSource};
use crate::faces::FaceExtractor;
use crate::session::{SessionError, SessionManager};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Ingestion errors. Collaborator failures never show up here; they degrade.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Empty image upload")]
    EmptyImage,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to store upload: {0}")]
    Storage(#[from] std::io::Error),
}

/// One classified face from an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceReading {
    pub label: String,
    pub confidence: Option<f32>,

    /// True when no face was found and the whole image was classified
    pub degraded: bool,
}

impl FaceReading {
    fn from_classification(classification: &Classification, degraded: bool) -> Self {
        Self {
            label: classification.label.clone(),
            confidence: classification.confidence,
            degraded,
        }
    }
}

/// Everything recorded for one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub session_id: String,
    pub source_image: PathBuf,
    pub readings: Vec<FaceReading>,
}

/// Runs uploads through face extraction and classification into the session
pub struct Ingestor {
    manager: Arc<SessionManager>,
    extractor: Arc<dyn FaceExtractor>,
    source: Arc<dyn EmotionSource>,
    store: ArtifactStore,
}

impl Ingestor {
    pub fn new(
        manager: Arc<SessionManager>,
        extractor: Arc<dyn FaceExtractor>,
        source: Arc<dyn EmotionSource>,
        store: ArtifactStore,
    ) -> Self {
        Self {
            manager,
            extractor,
            source,
            store,
        }
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Process one screenshot
    pub async fn ingest(&self, image: Vec<u8>) -> Result<IngestOutcome, IngestError> {
        if image.is_empty() {
            return Err(IngestError::EmptyImage);
        }

        // Strict mode: reject before anything touches the disk
        if !self.manager.auto_start() && !self.manager.is_active().await {
            return Err(SessionError::NoActiveSession.into());
        }

        let (shot_id, source_path) = self.store.save_screenshot(&image).await?;
        let mut written = vec![source_path.clone()];

        let image = Arc::new(image);
        let faces = self.extract_faces(Arc::clone(&image)).await;

        let result = self
            .classify_and_record(shot_id, &source_path, &image, faces, &mut written)
            .await;

        match result {
            Ok((session_id, readings)) => Ok(IngestOutcome {
                session_id,
                source_image: source_path,
                readings,
            }),
            Err(e) => {
                self.store.discard(&written).await;
                Err(e)
            }
        }
    }

    /// Classify every face (or the whole image when there are none), then
    /// record all readings at once so one screenshot never spans two sessions
    async fn classify_and_record(
        &self,
        shot_id: u64,
        source_path: &Path,
        image: &[u8],
        faces: Vec<Vec<u8>>,
        written: &mut Vec<PathBuf>,
    ) -> Result<(String, Vec<FaceReading>), IngestError> {
        let mut batch = Vec::with_capacity(faces.len().max(1));
        let mut readings = Vec::with_capacity(faces.len().max(1));

        if faces.is_empty() {
            tracing::info!("No face found in screenshot {}, classifying whole image", shot_id);
            let classification = self.classify(image).await;
            readings.push(FaceReading::from_classification(&classification, true));
            batch.push((classification, None));
        }

        for (index, face) in faces.iter().enumerate() {
            let crop_path = self.store.save_face(shot_id, index + 1, face).await?;
            written.push(crop_path.clone());

            let classification = self.classify(face).await;
            readings.push(FaceReading::from_classification(&classification, false));
            batch.push((classification, Some(crop_path)));
        }

        let session_id = self.manager.record_batch(source_path, batch).await?;
        Ok((session_id, readings))
    }

    /// Extraction runs on the blocking pool; any failure means "no faces"
    async fn extract_faces(&self, image: Arc<Vec<u8>>) -> Vec<Vec<u8>> {
        let extractor = Arc::clone(&self.extractor);
        match tokio::task::spawn_blocking(move || extractor.extract(&image)).await {
            Ok(Ok(faces)) => faces,
            Ok(Err(e)) => {
                tracing::warn!("Face extraction failed: {:#}", e);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Face extraction task failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Classification failures become `unknown`
    async fn classify(&self, image: &[u8]) -> Classification {
        match self.source.classify(image).await {
            Ok(classification) => classification.resolve(),
            Err(e) => {
                tracing::warn!("Emotion source '{}' failed: {:#}", self.source.name(), e);
                Classification::unknown()
            }
        }
    }
}
