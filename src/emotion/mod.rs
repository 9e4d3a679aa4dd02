//! Emotion classification - source trait, label normalization, legacy parsing

mod remote;

pub use remote::HttpEmotionSource;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Label used when no meaningful prediction exists
pub const UNKNOWN_LABEL: &str = "unknown";

/// `(85.3%)`-style confidence embedded in a label
static LEGACY_CONFIDENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*([0-9]+(?:\.[0-9]+)?)\s*%\s*\)").unwrap());

/// A classifier answer: a label and an optional confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: Option<f32>,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            label: label.into(),
            confidence: sanitize_confidence(confidence),
        }
    }

    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            confidence: None,
        }
    }

    /// Split a decorated label such as `"😊 happy (85.3%)"` into
    /// `happy` / `0.853`. Labels without the pattern keep no confidence.
    pub fn from_legacy_label(raw: &str) -> Self {
        Self {
            label: normalize_label(raw),
            confidence: parse_legacy_confidence(raw),
        }
    }

    /// Fill in a missing confidence from a decorated label and clamp
    /// whatever confidence is present
    pub fn resolve(self) -> Self {
        if self.confidence.is_none() && LEGACY_CONFIDENCE_RE.is_match(&self.label) {
            Self::from_legacy_label(&self.label)
        } else {
            Self::new(self.label, self.confidence)
        }
    }

    pub fn is_unknown(&self) -> bool {
        normalize_label(&self.label) == UNKNOWN_LABEL
    }
}

/// Anything that can turn image bytes into an emotion label
#[async_trait]
pub trait EmotionSource: Send + Sync {
    /// Source identifier for logs
    fn name(&self) -> &'static str;

    /// Classify one face image. Should answer `unknown` rather than fail
    /// when there is no meaningful prediction.
    async fn classify(&self, image: &[u8]) -> Result<Classification>;
}

/// Source used when no classifier is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmotionSource;

#[async_trait]
impl EmotionSource for NullEmotionSource {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn classify(&self, _image: &[u8]) -> Result<Classification> {
        Ok(Classification::unknown())
    }
}

/// Extract the `(NN.N%)` confidence from a label, as a fraction
pub fn parse_legacy_confidence(raw: &str) -> Option<f32> {
    let caps = LEGACY_CONFIDENCE_RE.captures(raw)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    sanitize_confidence(Some((percent / 100.0) as f32))
}

/// Lowercase base label with emoji and confidence decoration removed
pub fn normalize_label(raw: &str) -> String {
    let stripped = LEGACY_CONFIDENCE_RE.replace_all(raw, " ");
    let words: Vec<String> = stripped
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .map(str::to_lowercase)
        .collect();

    if words.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        words.join(" ")
    }
}

/// Clamp into [0, 1]; NaN counts as absent
pub fn sanitize_confidence(confidence: Option<f32>) -> Option<f32> {
    confidence
        .filter(|c| !c.is_nan())
        .map(|c| c.clamp(0.0, 1.0))
}
