//! Decoder module
//!
//! This module turns the base64 `frm_payload` / `payload_raw` of an uplink
//! into calibrated temperature, humidity and battery values.
//!
//! The temperature and humidity conversions are the linearised transfer
//! functions of the sensor's humidity/temperature chip; battery voltage is
//! reported in 10 mV steps above 1.5 V.

use crate::error::{DecodeError, Result};
use crate::protocol::{
    PayloadFormat, SensorReading, BATTERY_OFFSET, HUMIDITY_OFFSET, TEMPERATURE_OFFSET,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decoder for RHF1S001 uplink payloads
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    format: PayloadFormat,
}

impl Decoder {
    /// Create a decoder for the default (auto-detecting) payload format
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder for a specific payload format
    pub fn with_format(format: PayloadFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    /// Decode a base64 payload as delivered in a webhook
    pub fn decode(&self, payload: &str) -> Result<SensorReading> {
        let bytes = STANDARD.decode(payload).map_err(DecodeError::from)?;
        self.decode_bytes(&bytes)
    }

    /// Decode from raw bytes
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<SensorReading> {
        let needed = self.format.min_len();
        if bytes.len() < needed {
            return Err(DecodeError::BufferTooShort {
                needed,
                available: bytes.len(),
            }
            .into());
        }

        let raw_t = u16::from_le_bytes([bytes[TEMPERATURE_OFFSET], bytes[TEMPERATURE_OFFSET + 1]]);
        let raw_h = bytes[HUMIDITY_OFFSET];

        let mut reading = SensorReading::new(temperature_celsius(raw_t), humidity_percent(raw_h));
        if self.format.decodes_battery(bytes.len()) {
            reading.battery = Some(battery_volts(bytes[BATTERY_OFFSET]));
        }

        Ok(reading)
    }
}

/// Convert the raw temperature word to °C
pub fn temperature_celsius(raw: u16) -> f64 {
    (175.72 * raw as f64) / 65536.0 - 46.85
}

/// Convert the raw humidity byte to %RH
pub fn humidity_percent(raw: u8) -> f64 {
    (125.0 * raw as f64) / 256.0 - 6.0
}

/// Convert the raw battery byte to volts
pub fn battery_volts(raw: u8) -> f64 {
    (raw as f64 + 150.0) * 0.01
}
