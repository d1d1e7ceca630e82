//! Error types
//!
//! Configuration errors are fatal and surface before the tick loop starts.
//! Checkpoint errors stay on the predictor thread and are only logged there.

use thiserror::Error;

/// Invalid or unreadable game configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("actor {id}: mass must be positive (got {mass})")]
    InvalidMass { id: u32, mass: f64 },
    #[error("actor {id}: sample rate must be positive (got {rate})")]
    InvalidSampleRate { id: u32, rate: f64 },
    #[error("screen size must be positive on both axes (got {width}x{height})")]
    InvalidScreen { width: i32, height: i32 },
    #[error("pixels per meter must be positive (got {0})")]
    InvalidPixelScale(f64),
    #[error("predictor: {0}")]
    InvalidPredictor(String),
    #[error("shot period must be at least 1 tick (got {0})")]
    InvalidShotPeriod(i32),
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reading or writing predictor weights
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}
