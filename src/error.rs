//! Error types for lorasensor
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for lorasensor operations
pub type Result<T> = std::result::Result<T, LoraSensorError>;

/// Main error type for lorasensor operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoraSensorError {
    /// Decoding error
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Unknown payload format name
    #[error("Unknown payload format: {0} (expected auto, basic or battery)")]
    UnknownPayloadFormat(String),
}

/// Errors while turning an uplink payload into a reading
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is not valid base64
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Buffer too short for the configured payload format
    #[error("Buffer too short: need at least {needed} bytes, got {available}")]
    BufferTooShort { needed: usize, available: usize },
}
