// src/utils/error.rs
#![allow(dead_code)]
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum EdinetError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("EDINET API error (status {status}): {message}")]
    Api { status: u16, message: String }, // The service's own error payload

    #[error("Failed to parse EDINET response for {date}: {source}")]
    Parse {
        date: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Retries exhausted for {date} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        date: String,
        attempts: u32,
        last_error: String,
    },
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot file already exists: {0}")]
    FileExists(PathBuf),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDINET interaction failed: {0}")]
    Edinet(#[from] EdinetError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Index build failed: {0}")]
    Build(String),
}
