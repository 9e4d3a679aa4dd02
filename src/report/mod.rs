//! Report generation - turns a session's aggregated data into a document

mod html;
mod summary;
mod text;

pub use html::HtmlReportGenerator;
pub use summary::RemoteSummaryGenerator;
pub use text::TextReportGenerator;

use crate::session::{ReportData, ReportInput};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    Text,
}

impl ReportFormat {
    /// File extension for persisted reports
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Text => "txt",
        }
    }
}

/// Renders report documents. May fail; callers degrade gracefully.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn format(&self) -> ReportFormat;

    async fn render(&self, input: &ReportInput) -> Result<String>;
}

/// Emotions that read as positive engagement
const POSITIVE: &[&str] = &["happy", "surprise", "surprised"];

/// Emotions that read as strain or disengagement
const NEGATIVE: &[&str] = &["sad", "angry", "fear", "disgust", "bored", "confused"];

/// Most frequent label, ties broken alphabetically
pub fn dominant_emotion(data: &ReportData) -> Option<(&str, usize)> {
    data.frequencies
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(label, count)| (label.as_str(), *count))
}

/// Plain-language observations derived from the timeline
pub fn observations(data: &ReportData) -> Vec<String> {
    let total = data.timeline.len();
    let mut notes = Vec::new();

    if let Some((label, count)) = dominant_emotion(data) {
        notes.push(format!(
            "The dominant emotion was {} ({} of {} readings, {:.0}%).",
            label,
            count,
            total,
            percent(count, total)
        ));
    }

    let positive = count_in(data, POSITIVE);
    let negative = count_in(data, NEGATIVE);
    notes.push(format!(
        "Positive readings made up {:.0}% of the session and negative readings {:.0}%.",
        percent(positive, total),
        percent(negative, total)
    ));

    let labels: Vec<String> = data
        .timeline
        .iter()
        .map(|e| crate::emotion::normalize_label(&e.label))
        .collect();
    let transitions = labels.windows(2).filter(|w| w[0] != w[1]).count();
    notes.push(format!(
        "Observed {} emotional transition{} across {:.1} minutes.",
        transitions,
        if transitions == 1 { "" } else { "s" },
        data.duration_secs / 60.0
    ));

    let confidences: Vec<f32> = data.timeline.iter().filter_map(|e| e.confidence).collect();
    if !confidences.is_empty() {
        let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
        notes.push(format!(
            "Average classifier confidence was {:.0}%.",
            mean * 100.0
        ));
    }

    notes
}

/// Suggestions keyed off the overall mood
pub fn recommendations(data: &ReportData) -> Vec<String> {
    let total = data.timeline.len();
    let positive = percent(count_in(data, POSITIVE), total);
    let negative = percent(count_in(data, NEGATIVE), total);

    let mut recs = Vec::new();
    if negative > 40.0 {
        recs.push("Check in with participants early; a large share of readings showed strain.".to_string());
        recs.push("Break long agenda items into shorter segments with pauses.".to_string());
    } else if positive > 50.0 {
        recs.push("Keep the current format; engagement stayed largely positive.".to_string());
    } else {
        recs.push("Add interactive moments to lift a mostly neutral mood.".to_string());
    }
    recs.push("Compare this report with the next session to spot trends.".to_string());
    recs
}

fn count_in(data: &ReportData, set: &[&str]) -> usize {
    data.frequencies
        .iter()
        .filter(|(label, _)| set.contains(&label.as_str()))
        .map(|(_, count)| count)
        .sum()
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
