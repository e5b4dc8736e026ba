use std::io;

use thiserror::Error;

/// Failures while loading, saving or exporting attempt history
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("history is malformed: {0}")]
    Malformed(String),
    #[error("history encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history database failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Rejected session timing configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("lamp interval must be greater than zero")]
    ZeroLampInterval,
    #[error("minimum hold ({min_ms} ms) exceeds maximum hold ({max_ms} ms)")]
    InvertedHoldRange { min_ms: u64, max_ms: u64 },
    #[error("{field} of {ms} ms is longer than the {max_ms} ms limit")]
    TimingTooLong {
        field: &'static str,
        ms: u64,
        max_ms: u64,
    },
    #[error("history capacity must be at least one attempt")]
    ZeroCapacity,
    #[error("elite threshold must be a positive number of seconds, got {0}")]
    InvalidEliteThreshold(f64),
}
