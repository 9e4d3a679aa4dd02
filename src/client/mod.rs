//! Client module - command-line front end for a running server

mod api;

pub use api::ApiClient;

use crate::session::{ReportOutcome, SessionSummary};
use anyhow::{Context, Result};
use std::path::Path;

/// Print the current session, if any
pub async fn show_status(client: &ApiClient) -> Result<()> {
    let status = client.status().await?;
    match status.session {
        Some(summary) => print_summary(&summary),
        None => println!("No active session."),
    }
    Ok(())
}

/// Explicitly start a session (ends the current one first)
pub async fn start_session(client: &ApiClient) -> Result<()> {
    let response = client.start().await?;
    println!("Started session {}", response.session_id);
    Ok(())
}

/// End the current session and print its report location
pub async fn end_session(client: &ApiClient) -> Result<()> {
    let outcome = client.end().await?;
    print_summary(&outcome.summary);

    match &outcome.report {
        ReportOutcome::Rendered {
            file_name: Some(name),
            url,
            ..
        } => {
            println!("Report saved as {}", name);
            if let Some(url) = url {
                println!("View at {}{}", client.base_url(), url);
            }
        }
        ReportOutcome::Rendered {
            file_name: None, ..
        } => {
            println!("Report rendered but not saved:\n{}", outcome.report.content());
        }
        ReportOutcome::Degraded { content } => println!("{}", content),
    }

    println!(
        "Cleanup: {} deleted, {} already gone, {} failed",
        outcome.release.deleted,
        outcome.release.already_gone,
        outcome.release.failed.len()
    );
    Ok(())
}

/// Abort the current session without a report
pub async fn cleanup(client: &ApiClient) -> Result<()> {
    let response = client.cleanup().await?;
    match response.session {
        Some(summary) => println!(
            "Aborted session {}: {} files deleted",
            summary.session_id, response.release.deleted
        ),
        None => println!("No active session; nothing to clean up."),
    }
    for failure in &response.release.failed {
        println!("  failed: {} ({})", failure.path.display(), failure.reason);
    }
    Ok(())
}

/// Upload a screenshot from disk
pub async fn upload_file(client: &ApiClient, path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;

    let response = client.upload(bytes).await?;
    println!("Session {}:", response.session_id);
    for reading in &response.readings {
        let confidence = reading
            .confidence
            .map(|c| format!(" ({:.1}%)", c * 100.0))
            .unwrap_or_default();
        let degraded = if reading.degraded { " [whole image]" } else { "" };
        println!("  {}{}{}", reading.label, confidence, degraded);
    }
    Ok(())
}

/// Print a persisted report to stdout
pub async fn show_report(client: &ApiClient, filename: &str) -> Result<()> {
    let content = client.report(filename).await?;
    println!("{}", content);
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    println!("Session:   {}", summary.session_id);
    println!("State:     {:?}", summary.state);
    println!("Started:   {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(ended) = summary.ended_at {
        println!("Ended:     {}", ended.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("Duration:  {:.1} minutes", summary.duration_secs / 60.0);
    println!("Readings:  {}", summary.reading_count);
    for (label, count) in &summary.frequencies {
        println!("  {:<12} {}", label, count);
    }
}
