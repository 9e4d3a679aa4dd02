//! HTTP client for a running moodlink server

use crate::protocol::{
    routes, CleanupResponse, ErrorResponse, HealthResponse, ReadingsResponse, StartResponse,
    StatusResponse,
};
use crate::session::SessionOutcome;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Thin typed wrapper over the server's JSON API
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.http.get(self.url(routes::HEALTH)).send().await;
        decode(response).await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        let response = self.http.get(self.url(routes::SESSION_STATUS)).send().await;
        decode(response).await
    }

    pub async fn start(&self) -> Result<StartResponse> {
        let response = self.http.post(self.url(routes::SESSION_START)).send().await;
        decode(response).await
    }

    pub async fn end(&self) -> Result<SessionOutcome> {
        let response = self.http.post(self.url(routes::SESSION_END)).send().await;
        decode(response).await
    }

    pub async fn cleanup(&self) -> Result<CleanupResponse> {
        let response = self.http.post(self.url(routes::SESSION_CLEANUP)).send().await;
        decode(response).await
    }

    /// Upload one screenshot
    pub async fn upload(&self, image: Vec<u8>) -> Result<ReadingsResponse> {
        let response = self
            .http
            .post(self.url(routes::READINGS))
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(image)
            .send()
            .await;
        decode(response).await
    }

    /// Fetch a persisted report document
    pub async fn report(&self, filename: &str) -> Result<String> {
        let response = self
            .http
            .get(self.url(&format!("{}/{}", routes::REPORTS, filename)))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{}: {}", status, error_message(response).await);
        }
        Ok(response.text().await?)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Result<reqwest::Response>) -> Result<T> {
    let response = response.context("Failed to reach moodlink server")?;
    let status = response.status();

    if !status.is_success() {
        bail!("{}: {}", status, error_message(response).await);
    }

    response
        .json()
        .await
        .context("Malformed response from server")
}

async fn error_message(response: reqwest::Response) -> String {
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => "unexpected error response".to_string(),
    }
}
