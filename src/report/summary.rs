//! Remote LLM summary - sends an analysis prompt to a `generateContent` endpoint

use super::text::{header, write_timeline};
use super::{ReportFormat, ReportGenerator};
use crate::session::{ReportData, ReportInput};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Text report whose body is written by a remote language model
pub struct RemoteSummaryGenerator {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteSummaryGenerator {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for summary generator")?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl ReportGenerator for RemoteSummaryGenerator {
    fn name(&self) -> &'static str {
        "remote-summary"
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }

    async fn render(&self, input: &ReportInput) -> Result<String> {
        let data = match input {
            ReportInput::Empty { session_id, .. } => {
                return Ok(format!(
                    "{}No emotion data collected during this session.\n",
                    header(session_id)
                ));
            }
            ReportInput::Timeline(data) => data,
        };

        let prompt = analysis_prompt(data)?;
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response: GenerateResponse = request
            .send()
            .await
            .with_context(|| format!("Summary endpoint {} unreachable", self.endpoint))?
            .error_for_status()
            .context("Summary endpoint rejected the request")?
            .json()
            .await
            .context("Malformed summary endpoint response")?;

        let summary: String = response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| anyhow!("Summary endpoint returned no text"))?;

        Ok(format!("{}{}\n", header(&data.session_id), summary.trim_end()))
    }
}

/// Prompt describing the session for the language model
pub fn analysis_prompt(data: &ReportData) -> Result<String> {
    let mut prompt = String::new();
    writeln!(
        prompt,
        "Analyze this meeting/session based on emotion detection data:\n"
    )?;
    writeln!(prompt, "SESSION DETAILS:")?;
    writeln!(prompt, "- Duration: {:.1} minutes", data.duration_secs / 60.0)?;
    writeln!(prompt, "- Total emotion readings: {}", data.timeline.len())?;
    writeln!(
        prompt,
        "- Started: {}",
        data.started_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    match data.ended_at {
        Some(t) => writeln!(prompt, "- Ended: {}\n", t.format("%Y-%m-%d %H:%M:%S"))?,
        None => writeln!(prompt, "- Ended: Ongoing\n")?,
    }

    write_timeline(&mut prompt, data)?;

    prompt.push_str(
        "\nPlease provide a comprehensive meeting summary including:\n\
         1. Overall mood and energy levels throughout the session\n\
         2. Key emotional patterns or trends observed\n\
         3. Potential insights about engagement, stress, or satisfaction\n\
         4. Recommendations for future meetings based on emotional feedback\n\
         5. Notable emotional transitions or moments\n\n\
         Format the response as a professional meeting analysis report.\n",
    );
    Ok(prompt)
}
