//! Plain-text meeting summary

use super::{observations, recommendations, ReportFormat, ReportGenerator};
use crate::session::{ReportData, ReportInput};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportGenerator;

impl TextReportGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportGenerator for TextReportGenerator {
    fn name(&self) -> &'static str {
        "text"
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }

    async fn render(&self, input: &ReportInput) -> Result<String> {
        let mut out = header(input.session_id());
        match input {
            ReportInput::Empty { .. } => {
                out.push_str("No emotion data collected during this session.\n");
            }
            ReportInput::Timeline(data) => write_body(&mut out, data)?,
        }
        Ok(out)
    }
}

/// Report heading shared by the text-based generators
pub(super) fn header(session_id: &str) -> String {
    format!(
        "Meeting Summary - {}\nGenerated: {}\n{}\n\n",
        session_id,
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(50)
    )
}

/// Timeline and frequency lines in the `• 1.5min: happy` style
pub(super) fn write_timeline(out: &mut String, data: &ReportData) -> std::fmt::Result {
    writeln!(out, "EMOTION TIMELINE:")?;
    for entry in &data.timeline {
        write!(out, "• {:.1}min: {}", entry.elapsed_secs / 60.0, entry.label)?;
        if let Some(c) = entry.confidence {
            write!(out, " ({:.1}%)", c * 100.0)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "\nEMOTION FREQUENCY:")?;
    for (label, count) in &data.frequencies {
        writeln!(out, "• {}: {} times", label, count)?;
    }
    Ok(())
}

fn write_body(out: &mut String, data: &ReportData) -> std::fmt::Result {
    writeln!(out, "SESSION DETAILS:")?;
    writeln!(out, "- Duration: {:.1} minutes", data.duration_secs / 60.0)?;
    writeln!(out, "- Total emotion readings: {}", data.timeline.len())?;
    writeln!(
        out,
        "- Started: {}",
        data.started_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    match data.ended_at {
        Some(t) => writeln!(out, "- Ended: {}", t.format("%Y-%m-%d %H:%M:%S"))?,
        None => writeln!(out, "- Ended: Ongoing")?,
    }
    writeln!(out)?;

    write_timeline(out, data)?;

    writeln!(out, "\nANALYSIS:")?;
    for (i, note) in observations(data).iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, note)?;
    }

    writeln!(out, "\nRECOMMENDATIONS:")?;
    for rec in recommendations(data) {
        writeln!(out, "- {}", rec)?;
    }
    Ok(())
}
