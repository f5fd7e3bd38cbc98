//! # Error Types
//!
//! Custom error types for padlink using `thiserror`.

use thiserror::Error;

/// Main error type for padlink
#[derive(Debug, Error)]
pub enum PadlinkError {
    /// Vibration preset name not present in the preset table
    #[error("Unknown vibration preset: {0}")]
    UnknownPreset(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Input device errors
    #[error("Device error: {0}")]
    Device(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for padlink
pub type Result<T> = std::result::Result<T, PadlinkError>;
