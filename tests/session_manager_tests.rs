//! Integration tests for SessionManager

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use moodlink::emotion::Classification;
use moodlink::report::{ReportFormat, ReportGenerator, TextReportGenerator};
use moodlink::session::{ReportInput, ReportOutcome, SessionError, SessionManager, SessionState};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::sync::Notify;
use tokio::time::timeout;

/// Generator that always fails
struct FailingReports;

#[async_trait]
impl ReportGenerator for FailingReports {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }

    async fn render(&self, _input: &ReportInput) -> Result<String> {
        Err(anyhow!("model offline"))
    }
}

/// Generator that counts calls and remembers reading counts
#[derive(Default)]
struct CountingReports {
    calls: AtomicUsize,
}

#[async_trait]
impl ReportGenerator for CountingReports {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }

    async fn render(&self, input: &ReportInput) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("report for {}", input.session_id()))
    }
}

/// Generator that blocks until released
#[derive(Default)]
struct GatedReports {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl ReportGenerator for GatedReports {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }

    async fn render(&self, input: &ReportInput) -> Result<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(format!("report for {}", input.session_id()))
    }
}

fn text_manager(dir: &TempDir) -> SessionManager {
    SessionManager::new(Arc::new(TextReportGenerator::new()), dir.path().join("reports"))
}

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"png").unwrap();
    path
}

#[tokio::test]
async fn test_scenario_start_record_end() -> Result<()> {
    let dir = tempdir()?;
    let manager = text_manager(&dir);

    manager.start().await;
    manager
        .record_emotion(
            "happy",
            Some(0.9),
            Some(touch(dir.path(), "a.png")),
            Some(touch(dir.path(), "a_crop.png")),
        )
        .await?;
    manager
        .record_emotion(
            "sad",
            Some(0.7),
            Some(touch(dir.path(), "b.png")),
            Some(touch(dir.path(), "b_crop.png")),
        )
        .await?;

    let outcome = manager.end().await?;

    assert_eq!(outcome.summary.reading_count, 2);
    assert_eq!(outcome.summary.frequencies.get("happy"), Some(&1));
    assert_eq!(outcome.summary.frequencies.get("sad"), Some(&1));
    assert_eq!(outcome.summary.artifact_count, 4);
    assert_eq!(outcome.release.deleted, 4);
    assert_eq!(outcome.release.preserved, 1);

    for name in ["a.png", "a_crop.png", "b.png", "b_crop.png"] {
        assert!(!dir.path().join(name).exists(), "{} should be deleted", name);
    }

    let file_name = outcome.report.file_name().expect("report should be saved");
    assert!(file_name.ends_with(".txt"));
    assert!(manager.report_dir().join(file_name).exists());
    assert_eq!(
        outcome.report.url(),
        Some(format!("/reports/{}", file_name).as_str())
    );
    assert!(outcome.report.content().contains("Meeting Summary"));

    assert!(manager.status().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_record_without_start_creates_session() -> Result<()> {
    let dir = tempdir()?;
    let manager = text_manager(&dir);

    let id = manager.record_emotion("neutral", None, None, None).await?;

    let status = manager.status().await.expect("session should exist");
    assert_eq!(status.session_id, id);
    assert_eq!(status.reading_count, 1);
    assert_eq!(status.state, SessionState::Active);
    Ok(())
}

#[tokio::test]
async fn test_end_without_session() -> Result<()> {
    let dir = tempdir()?;
    let manager = text_manager(&dir);

    let err = manager.end().await.unwrap_err();
    assert_eq!(err, SessionError::NoActiveSession);
    assert!(manager.status().await.is_none());
    assert!(!dir.path().join("reports").exists());
    Ok(())
}

#[tokio::test]
async fn test_strict_mode_rejects_recording() -> Result<()> {
    let dir = tempdir()?;
    let manager = text_manager(&dir).with_auto_start(false);

    let err = manager
        .record_emotion("happy", None, None, None)
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NoActiveSession);
    assert!(manager.status().await.is_none());

    manager.start().await;
    manager.record_emotion("happy", None, None, None).await?;
    assert_eq!(manager.status().await.unwrap().reading_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_start_finalizes_previous_session() -> Result<()> {
    let dir = tempdir()?;
    let reports = Arc::new(CountingReports::default());
    let manager = SessionManager::new(reports.clone(), dir.path().join("reports"));

    let first = manager.start().await;
    let shot = touch(dir.path(), "old.png");
    manager
        .record_emotion("happy", None, Some(shot.clone()), None)
        .await?;

    let second = manager.start().await;
    assert_ne!(first, second);

    // Previous session got its report and cleanup
    assert_eq!(reports.calls.load(Ordering::SeqCst), 1);
    assert!(!shot.exists());

    let status = manager.status().await.unwrap();
    assert_eq!(status.session_id, second);
    assert_eq!(status.reading_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_report_failure_still_cleans_up() -> Result<()> {
    let dir = tempdir()?;
    let manager = SessionManager::new(Arc::new(FailingReports), dir.path().join("reports"));

    let shot = touch(dir.path(), "shot.png");
    manager
        .record_emotion("angry", Some(0.6), Some(shot.clone()), None)
        .await?;

    let outcome = manager.end().await?;

    match &outcome.report {
        ReportOutcome::Degraded { content } => assert!(content.contains("model offline")),
        other => panic!("Expected degraded report, got {:?}", other),
    }
    assert_eq!(outcome.release.deleted, 1);
    assert!(!shot.exists());
    assert!(manager.status().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_empty_session_report() -> Result<()> {
    let dir = tempdir()?;
    let manager = text_manager(&dir);

    manager.start().await;
    let outcome = manager.end().await?;

    assert_eq!(outcome.summary.reading_count, 0);
    assert!(outcome
        .report
        .content()
        .contains("No emotion data collected"));
    Ok(())
}

#[tokio::test]
async fn test_abort_deletes_without_report() -> Result<()> {
    let dir = tempdir()?;
    let reports = Arc::new(CountingReports::default());
    let manager = SessionManager::new(reports.clone(), dir.path().join("reports"));

    let shot = touch(dir.path(), "shot.png");
    manager
        .record_emotion("sad", None, Some(shot.clone()), None)
        .await?;

    let outcome = manager.abort().await.expect("a session was active");
    assert_eq!(outcome.release.deleted, 1);
    assert_eq!(outcome.summary.reading_count, 1);
    assert_eq!(reports.calls.load(Ordering::SeqCst), 0);
    assert!(!shot.exists());
    assert!(manager.status().await.is_none());

    assert!(manager.abort().await.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_records_are_not_lost() -> Result<()> {
    let dir = tempdir()?;
    let manager = Arc::new(text_manager(&dir));
    manager.start().await;

    let mut handles = Vec::new();
    for i in 0..64 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            let label = if i % 2 == 0 { "happy" } else { "sad" };
            manager.record_emotion(label, Some(0.5), None, None).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1, "all readings should land in one session");

    let outcome = manager.end().await?;
    assert_eq!(outcome.summary.reading_count, 64);
    assert_eq!(outcome.summary.frequencies.get("happy"), Some(&32));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_implicit_starts_create_one_session() -> Result<()> {
    let dir = tempdir()?;
    let manager = Arc::new(text_manager(&dir));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.record_emotion("neutral", None, None, None).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(manager.status().await.unwrap().reading_count, 32);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_at_most_one_active_session_under_churn() -> Result<()> {
    let dir = tempdir()?;
    let manager = Arc::new(text_manager(&dir));

    let mut handles = Vec::new();
    for i in 0..48 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            match i % 3 {
                0 => {
                    manager.start().await;
                }
                1 => {
                    let _ = manager.record_emotion("happy", None, None, None).await;
                }
                _ => {
                    let _ = manager.end().await;
                }
            }
            // Every observation sees either nothing or one active session
            if let Some(status) = manager.status().await {
                assert_eq!(status.state, SessionState::Active);
            }
        }));
    }

    for handle in handles {
        handle.await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_status_does_not_mutate() -> Result<()> {
    let dir = tempdir()?;
    let manager = text_manager(&dir);

    assert!(manager.status().await.is_none());
    assert!(!manager.is_active().await);

    manager.record_emotion("happy", None, None, None).await?;
    let a = manager.status().await.unwrap();
    let b = manager.status().await.unwrap();
    assert_eq!(a.session_id, b.session_id);
    assert_eq!(a.reading_count, b.reading_count);
    Ok(())
}

#[tokio::test]
async fn test_slow_report_does_not_block_session_calls() -> Result<()> {
    let dir = tempdir()?;
    let reports = Arc::new(GatedReports::default());
    let manager = Arc::new(SessionManager::new(reports.clone(), dir.path().join("reports")));

    let first = manager.record_emotion("happy", None, None, None).await?;

    let ending = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.end().await })
    };
    reports.entered.notified().await;

    // Report is still rendering: the old session is gone and a new one can start
    let status = timeout(Duration::from_secs(1), manager.status()).await?;
    assert!(status.is_none());

    let second = timeout(
        Duration::from_secs(1),
        manager.record_emotion("sad", None, None, None),
    )
    .await??;
    assert_ne!(first, second);

    reports.release.notify_one();
    let outcome = ending.await??;
    assert_eq!(outcome.summary.session_id, first);
    assert_eq!(outcome.summary.reading_count, 1);
    assert_eq!(manager.status().await.unwrap().session_id, second);
    Ok(())
}

#[tokio::test]
async fn test_record_batch_shares_source() -> Result<()> {
    let dir = tempdir()?;
    let manager = text_manager(&dir);

    let shot = touch(dir.path(), "shot.png");
    let id = manager
        .record_batch(
            &shot,
            vec![
                (Classification::new("happy", Some(0.8)), Some(touch(dir.path(), "f1.png"))),
                (Classification::new("sad", None), Some(touch(dir.path(), "f2.png"))),
            ],
        )
        .await?;

    let status = manager.status().await.unwrap();
    assert_eq!(status.session_id, id);
    assert_eq!(status.reading_count, 2);
    assert_eq!(status.artifact_count, 3);

    let strict = text_manager(&dir).with_auto_start(false);
    let err = strict
        .record_batch(&shot, vec![(Classification::unknown(), None)])
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NoActiveSession);
    Ok(())
}
