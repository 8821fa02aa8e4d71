// LoRa Sensor Exporter - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the exporter process

use thiserror::Error;

/// Errors that stop the exporter from starting or serving
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metric registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Listener or socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for exporter operations
pub type Result<T> = std::result::Result<T, ExporterError>;
