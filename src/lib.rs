//! # lorasensor - RisingHF RHF1S001 payloads from The Things Network
//!
//! Parsing and decoding for uplinks of the RisingHF outdoor
//! temperature/humidity LoRaWAN sensor, as delivered by TTN v2 and v3
//! HTTP integrations.
//!
//! ## Quick Start
//!
//! ```rust
//! use lorasensor::{Decoder, Envelope, Interest, InterestFilter};
//!
//! let body = r#"{"dev_id": "risinghf-001", "port": 8, "payload_raw": "AQBkMg=="}"#;
//! let envelope = Envelope::from_json(body).unwrap();
//!
//! let filter = InterestFilter::default();
//! if let Interest::Match { uplink, .. } = filter.classify(&envelope) {
//!     let reading = Decoder::new().decode(&uplink.payload).unwrap();
//!     assert!((reading.temperature - 21.79).abs() < 0.01);
//!     assert!((reading.humidity - 18.41).abs() < 0.01);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: Payload layout, formats and reading types
//! - [`decoder`]: Payload decoding
//! - [`envelope`]: Webhook schemas and the interest filter
//! - [`error`]: Error types

// Modules
pub mod decoder;
pub mod envelope;
pub mod error;
pub mod protocol;

// Re-exports for convenient access
pub use decoder::Decoder;
pub use envelope::{Envelope, Interest, InterestFilter, SchemaVersion, Uplink};
pub use error::{DecodeError, LoraSensorError, Result};
pub use protocol::{Observation, PayloadFormat, SensorReading};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_basic_pipeline() {
        let body = r#"{"end_device_ids": {"device_id": "risinghf-9"},
                       "uplink_message": {"f_port": 8, "frm_payload": "AQBkMg=="}}"#;
        let envelope = Envelope::from_json(body).unwrap();

        let uplink = match InterestFilter::default().classify(&envelope) {
            Interest::Match { uplink, .. } => uplink,
            other => panic!("expected match, got {:?}", other),
        };
        let reading = Decoder::new().decode(&uplink.payload).unwrap();

        assert!((reading.temperature - 21.790625).abs() < 1e-6);
    }
}
