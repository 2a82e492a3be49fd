//! Error types for the nearby engine

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NearbyError {
    // Store errors
    #[error("Spatial store query failed: {reason}")]
    Store { reason: String },

    // Configuration errors
    #[error("Config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, NearbyError>;
