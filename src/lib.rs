//! Content Analysis Relay
//!
//! This library provides the core functionality for the scan-relay system:
//! thin REST endpoints that submit analysis jobs (transcription, AI-text
//! detection, deepfake detection, GDPR scanning) to third-party providers,
//! track their completion asynchronously, and persist normalized results.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
