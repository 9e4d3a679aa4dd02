//! moodlink - meeting emotion tracking
//!
//! This crate provides the core functionality for moodlink, including:
//! - Session management (emotion timelines, artifact cleanup, lifecycle)
//! - Screenshot ingestion (face extraction, emotion classification)
//! - End-of-meeting report generation
//! - HTTP API server and client
//!
//! # Architecture
//!
//! moodlink uses a client-server model where:
//! - The server (`moodlink-server`) holds the single active meeting session
//! - Capture clients post screenshots to `POST /readings`
//! - The CLI (`moodlink`) queries, ends and cleans up sessions over HTTP

pub mod client;
pub mod config;
pub mod emotion;
pub mod faces;
pub mod pipeline;
pub mod protocol;
pub mod report;
pub mod server;
pub mod session;
