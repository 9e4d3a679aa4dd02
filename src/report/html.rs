//! HTML report rendered from a fixed template

use super::{observations, recommendations, ReportFormat, ReportGenerator};
use crate::emotion::normalize_label;
use crate::session::{ReportData, ReportInput};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Meeting Emotion Analysis Report</title>
    <style>
        :root {
            --bg-primary: #1a1a2e;
            --bg-card: #0f3460;
            --text-light: #e0e0e0;
            --text-medium: #c0c0c0;
            --accent-blue: #53d8fb;
            --border-color: rgba(255, 255, 255, 0.1);
            --emotion-neutral: #add8e6;
            --emotion-happy: #ffdd4a;
            --emotion-sad: #4682b4;
            --emotion-angry: #dc143c;
            --emotion-surprise: #bb86fc;
            --emotion-fear: #9370db;
            --emotion-disgust: #6b8e23;
            --emotion-unknown: #808080;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: sans-serif; background: var(--bg-primary); color: var(--text-light); line-height: 1.6; }
        header { padding: 3rem 1.5rem; text-align: center; border-bottom: 2px solid var(--border-color); }
        header h1 { font-size: 2.5rem; color: var(--accent-blue); }
        header p { color: var(--text-medium); }
        main { max-width: 1200px; margin: 2rem auto; padding: 0 1.5rem; display: grid; gap: 2rem;
               grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); }
        section { background: var(--bg-card); border-radius: 15px; padding: 2rem; border: 1px solid var(--border-color); }
        section.wide { grid-column: 1 / -1; }
        section h2 { margin-bottom: 1rem; }
        .bar { margin: 0.5rem 0; }
        .bar-track { background: rgba(255, 255, 255, 0.1); border-radius: 6px; overflow: hidden; }
        .bar-fill { height: 1.5rem; padding: 0 0.5rem; color: #111; white-space: nowrap; }
        .timeline-event { border-left: 4px solid var(--accent-blue); margin: 0.5rem 0; padding: 0.4rem 0.8rem; }
        .timeline-event time { color: var(--text-medium); margin-right: 0.75rem; }
        ol, ul { padding-left: 1.5rem; }
        footer { text-align: center; padding: 1.5rem; color: var(--text-medium); }
    </style>
</head>
<body>
    <header>
        <h1>Meeting Emotion Analysis Report</h1>
        <p>Session {{SESSION_ID}}</p>
    </header>
    <main>
        <section class="session-overview">
            <h2>Session Overview</h2>
            <div><strong>Duration:</strong> <span>{{DURATION}}</span></div>
            <div><strong>Total Emotion Readings:</strong> <span>{{TOTAL_READINGS}}</span></div>
            <div><strong>Started:</strong> <span>{{START_TIME}}</span></div>
            <div><strong>Ended:</strong> <span>{{END_TIME}}</span></div>
        </section>
        <section class="emotion-summary">
            <h2>Emotion Frequency</h2>
            <div class="emotion-frequency-chart">
{{EMOTION_CHART_BARS}}
            </div>
        </section>
        <section class="wide">
            <h2>Emotion Timeline</h2>
            <div class="emotion-timeline">
{{TIMELINE_EVENTS}}
            </div>
        </section>
        <section class="wide">
            <h2>Detailed Analysis</h2>
            <ol>
{{ANALYSIS_POINTS}}
            </ol>
        </section>
        <section class="wide">
            <h2>Recommendations for Future Meetings</h2>
            <ul>
{{RECOMMENDATIONS}}
            </ul>
        </section>
    </main>
    <footer>
        <p>Generated {{GENERATED_AT}}</p>
    </footer>
</body>
</html>
"#;

/// Renders the fixed HTML template locally
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReportGenerator;

impl HtmlReportGenerator {
    pub fn new() -> Self {
        Self
    }

    fn render_data(&self, data: &ReportData) -> String {
        let total = data.timeline.len();

        let bars: Vec<String> = data
            .frequencies
            .iter()
            .map(|(label, count)| {
                let width = *count as f64 * 100.0 / total.max(1) as f64;
                format!(
                    r#"                <div class="bar"><div class="bar-track"><div class="bar-fill" style="width: {:.1}%; background: var(--emotion-{});">{} ({})</div></div></div>"#,
                    width,
                    css_class(label),
                    escape_html(label),
                    count
                )
            })
            .collect();

        let events: Vec<String> = data
            .timeline
            .iter()
            .map(|entry| {
                let confidence = entry
                    .confidence
                    .map(|c| format!(" ({:.1}%)", c * 100.0))
                    .unwrap_or_default();
                format!(
                    r#"                <div class="timeline-event"><time>{:.1} min</time>{}{}</div>"#,
                    entry.elapsed_secs / 60.0,
                    escape_html(&entry.label),
                    confidence
                )
            })
            .collect();

        fill(
            &data.session_id,
            &format!("{:.1} minutes", data.duration_secs / 60.0),
            total,
            data.started_at,
            data.ended_at,
            &bars.join("\n"),
            &events.join("\n"),
            &list_items(&observations(data)),
            &list_items(&recommendations(data)),
        )
    }
}

#[async_trait]
impl ReportGenerator for HtmlReportGenerator {
    fn name(&self) -> &'static str {
        "html"
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Html
    }

    async fn render(&self, input: &ReportInput) -> Result<String> {
        Ok(match input {
            ReportInput::Empty {
                session_id,
                started_at,
                ended_at,
            } => fill(
                session_id,
                "0.0 minutes",
                0,
                *started_at,
                *ended_at,
                "",
                r#"                <p>No emotion data collected during this session.</p>"#,
                "",
                "",
            ),
            ReportInput::Timeline(data) => self.render_data(data),
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn fill(
    session_id: &str,
    duration: &str,
    total: usize,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    bars: &str,
    events: &str,
    analysis: &str,
    recommendations: &str,
) -> String {
    TEMPLATE
        .replace("{{SESSION_ID}}", &escape_html(session_id))
        .replace("{{DURATION}}", duration)
        .replace("{{TOTAL_READINGS}}", &total.to_string())
        .replace("{{START_TIME}}", &format_time(Some(started_at)))
        .replace("{{END_TIME}}", &format_time(ended_at))
        .replace("{{EMOTION_CHART_BARS}}", bars)
        .replace("{{TIMELINE_EVENTS}}", events)
        .replace("{{ANALYSIS_POINTS}}", analysis)
        .replace("{{RECOMMENDATIONS}}", recommendations)
        .replace("{{GENERATED_AT}}", &format_time(Some(Utc::now())))
}

fn list_items(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| format!("                <li>{}</li>", escape_html(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "Ongoing".to_string())
}

/// Known emotions get their own color; everything else is grey
fn css_class(label: &str) -> &'static str {
    match normalize_label(label).as_str() {
        "happy" => "happy",
        "sad" => "sad",
        "angry" => "angry",
        "surprise" | "surprised" => "surprise",
        "fear" => "fear",
        "disgust" => "disgust",
        "neutral" => "neutral",
        _ => "unknown",
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
