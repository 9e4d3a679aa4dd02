//! Report generators and HTTP collaborators against local mock endpoints

use anyhow::Result;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use moodlink::emotion::{EmotionSource, HttpEmotionSource};
use moodlink::report::{
    dominant_emotion, recommendations, HtmlReportGenerator, RemoteSummaryGenerator,
    ReportGenerator, TextReportGenerator,
};
use moodlink::session::{ReportData, ReportInput, TimelineEntry};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral port and return its base URL
async fn mock_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn sample_data(labels: &[(&str, Option<f32>)]) -> ReportData {
    let now = Utc::now();
    let mut frequencies = BTreeMap::new();
    let timeline = labels
        .iter()
        .enumerate()
        .map(|(i, (label, confidence))| {
            *frequencies.entry(label.to_string()).or_insert(0) += 1;
            TimelineEntry {
                elapsed_secs: i as f64 * 30.0,
                timestamp: now,
                label: label.to_string(),
                confidence: *confidence,
            }
        })
        .collect();

    ReportData {
        session_id: "meeting_20260101_090000_deadbeef".to_string(),
        started_at: now,
        ended_at: Some(now),
        duration_secs: labels.len() as f64 * 30.0,
        timeline,
        frequencies,
    }
}

#[test]
fn test_dominant_emotion_tie_breaks_alphabetically() {
    let data = sample_data(&[("sad", None), ("happy", None)]);
    assert_eq!(dominant_emotion(&data), Some(("happy", 1)));

    let data = sample_data(&[("sad", None), ("happy", None), ("sad", None)]);
    assert_eq!(dominant_emotion(&data), Some(("sad", 2)));
}

#[test]
fn test_recommendations_follow_mood() {
    let gloomy = sample_data(&[("sad", None), ("angry", None), ("neutral", None)]);
    assert!(recommendations(&gloomy)[0].contains("Check in"));

    let bright = sample_data(&[("happy", None), ("happy", None), ("neutral", None)]);
    assert!(recommendations(&bright)[0].contains("Keep the current format"));
}

#[tokio::test]
async fn test_text_report_sections() -> Result<()> {
    let data = sample_data(&[("happy", Some(0.9)), ("sad", None)]);
    let text = TextReportGenerator::new()
        .render(&ReportInput::Timeline(data))
        .await?;

    for section in [
        "SESSION DETAILS:",
        "EMOTION TIMELINE:",
        "EMOTION FREQUENCY:",
        "ANALYSIS:",
        "RECOMMENDATIONS:",
    ] {
        assert!(text.contains(section), "missing {}", section);
    }
    assert!(text.contains("• 0.0min: happy (90.0%)"));
    assert!(text.contains("• 0.5min: sad\n"));
    assert!(text.contains("• happy: 1 times"));
    Ok(())
}

#[tokio::test]
async fn test_html_report_escapes_labels() -> Result<()> {
    let data = sample_data(&[("<script>", Some(0.5))]);
    let html = HtmlReportGenerator::new()
        .render(&ReportInput::Timeline(data))
        .await?;

    assert!(html.contains("meeting_20260101_090000_deadbeef"));
    assert!(!html.contains("<script>"));
    assert!(!html.contains("{{"));
    Ok(())
}

#[tokio::test]
async fn test_http_emotion_source_picks_best_score() -> Result<()> {
    let router = Router::new().route(
        "/classify",
        post(|headers: HeaderMap, body: axum::body::Bytes| async move {
            assert_eq!(body.as_ref(), b"face");
            assert_eq!(headers["authorization"], "Bearer secret");
            Json(json!([
                { "label": "sad", "score": 0.2 },
                { "label": "happy", "score": 0.7 },
                { "label": "neutral", "score": 0.1 }
            ]))
        }),
    );
    let base = mock_server(router).await;

    let source = HttpEmotionSource::new(
        format!("{}/classify", base),
        Some("secret".to_string()),
        Duration::from_secs(5),
    )?;
    let c = source.classify(b"face").await?;

    assert_eq!(c.label, "happy");
    assert_eq!(c.confidence, Some(0.7));
    Ok(())
}

#[tokio::test]
async fn test_http_emotion_source_empty_and_error() -> Result<()> {
    let router = Router::new()
        .route("/empty", post(|| async { Json(json!([])) }))
        .route(
            "/loading",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "Model is loading" })),
                )
            }),
        );
    let base = mock_server(router).await;

    let empty = HttpEmotionSource::new(format!("{}/empty", base), None, Duration::from_secs(5))?;
    assert!(empty.classify(b"face").await?.is_unknown());

    let loading =
        HttpEmotionSource::new(format!("{}/loading", base), None, Duration::from_secs(5))?;
    let err = loading.classify(b"face").await.unwrap_err();
    assert!(format!("{:#}", err).contains("Model is loading"));
    Ok(())
}

#[tokio::test]
async fn test_remote_summary_report() -> Result<()> {
    let router = Router::new().route(
        "/generate",
        post(
            |Query(params): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                assert_eq!(params.get("key").map(String::as_str), Some("k"));
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
                assert!(prompt.contains("EMOTION TIMELINE:"));
                assert!(prompt.contains("happy"));
                Json(json!({
                    "candidates": [
                        { "content": { "parts": [ { "text": "Mood was upbeat." } ] } }
                    ]
                }))
            },
        ),
    );
    let base = mock_server(router).await;

    let generator = RemoteSummaryGenerator::new(
        format!("{}/generate", base),
        Some("k".to_string()),
        Duration::from_secs(5),
    )?;
    let data = sample_data(&[("happy", Some(0.8))]);
    let report = generator.render(&ReportInput::Timeline(data)).await?;

    assert!(report.starts_with("Meeting Summary - meeting_20260101_090000_deadbeef"));
    assert!(report.contains("Mood was upbeat."));
    Ok(())
}

#[tokio::test]
async fn test_remote_summary_without_text_fails() -> Result<()> {
    let router = Router::new().route(
        "/generate",
        post(|| async { Json(json!({ "candidates": [] })) }),
    );
    let base = mock_server(router).await;

    let generator =
        RemoteSummaryGenerator::new(format!("{}/generate", base), None, Duration::from_secs(5))?;
    let data = sample_data(&[("happy", None)]);
    assert!(generator.render(&ReportInput::Timeline(data)).await.is_err());
    Ok(())
}
