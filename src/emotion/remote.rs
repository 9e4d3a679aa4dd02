//! HTTP emotion source speaking the image-classification inference format
//!
//! The endpoint receives the raw image bytes and answers with a list of
//! `{ "label": ..., "score": ... }` predictions.

use super::{Classification, EmotionSource};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Predictions(Vec<Prediction>),
    Error { error: String },
}

/// Classifier backed by a remote inference endpoint
pub struct HttpEmotionSource {
    endpoint: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HttpEmotionSource {
    pub fn new(endpoint: String, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for emotion source")?;

        Ok(Self {
            endpoint,
            api_token,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmotionSource for HttpEmotionSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn classify(&self, image: &[u8]) -> Result<Classification> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec());

        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Emotion endpoint {} unreachable", self.endpoint))?;

        let status = response.status();
        let body: InferenceResponse = response
            .json()
            .await
            .context("Malformed emotion endpoint response")?;

        let predictions = match body {
            InferenceResponse::Predictions(p) => p,
            InferenceResponse::Error { error } => {
                bail!("Emotion endpoint returned {}: {}", status, error)
            }
        };

        let best = predictions
            .into_iter()
            .filter(|p| !p.score.is_nan())
            .max_by(|a, b| a.score.total_cmp(&b.score));

        Ok(match best {
            Some(p) => Classification::new(p.label, Some(p.score)),
            None => {
                tracing::debug!("Emotion endpoint returned no predictions");
                Classification::unknown()
            }
        })
    }
}
