//! Protocol definitions for the RHF1S001 sensor payload
//!
//! This module defines the core types shared by the decoder and the exporter:
//! - Byte layout of the uplink payload
//! - Payload formats (firmware generations)
//! - Decoded readings and timestamped observations
//!
//! Payload layout (little-endian, datasheet RHF-DS01588):
//!
//! ```text
//! offset  0      1..3          3          4..8      8
//!        +------+-------------+----------+---------+---------+
//!        | hdr  | temperature | humidity | ...     | battery |
//!        +------+-------------+----------+---------+---------+
//! ```

use crate::error::LoraSensorError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Offset of the little-endian u16 temperature word
pub const TEMPERATURE_OFFSET: usize = 1;

/// Offset of the u8 humidity byte
pub const HUMIDITY_OFFSET: usize = 3;

/// Offset of the u8 battery byte
pub const BATTERY_OFFSET: usize = 8;

/// Minimum payload length carrying temperature and humidity
pub const BASIC_PAYLOAD_LEN: usize = HUMIDITY_OFFSET + 1;

/// Minimum payload length carrying the battery byte as well
pub const BATTERY_PAYLOAD_LEN: usize = BATTERY_OFFSET + 1;

/// Which fields the decoder expects in a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PayloadFormat {
    /// Temperature and humidity only (first firmware generation)
    Basic,
    /// Temperature, humidity and battery voltage
    WithBattery,
    /// Temperature and humidity, plus battery whenever the payload is long enough
    #[default]
    Auto,
}

impl PayloadFormat {
    /// Minimum number of bytes a payload must carry for this format
    pub fn min_len(&self) -> usize {
        match self {
            PayloadFormat::Basic | PayloadFormat::Auto => BASIC_PAYLOAD_LEN,
            PayloadFormat::WithBattery => BATTERY_PAYLOAD_LEN,
        }
    }

    /// Whether a payload of `len` bytes should have its battery byte decoded
    pub fn decodes_battery(&self, len: usize) -> bool {
        match self {
            PayloadFormat::Basic => false,
            PayloadFormat::WithBattery => true,
            PayloadFormat::Auto => len >= BATTERY_PAYLOAD_LEN,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Basic => "basic",
            PayloadFormat::WithBattery => "battery",
            PayloadFormat::Auto => "auto",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadFormat {
    type Err = LoraSensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(PayloadFormat::Basic),
            "battery" | "with-battery" => Ok(PayloadFormat::WithBattery),
            "auto" => Ok(PayloadFormat::Auto),
            other => Err(LoraSensorError::UnknownPayloadFormat(other.to_string())),
        }
    }
}

/// Calibrated values decoded from one payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Temperature in °C
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// Battery voltage in V, when the payload format carries it
    pub battery: Option<f64>,
}

impl SensorReading {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
            battery: None,
        }
    }

    pub fn with_battery(temperature: f64, humidity: f64, battery: f64) -> Self {
        Self {
            temperature,
            humidity,
            battery: Some(battery),
        }
    }
}

/// A reading stamped with the time its uplink was accepted
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub reading: SensorReading,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(reading: SensorReading, observed_at: DateTime<Utc>) -> Self {
        Self {
            reading,
            observed_at,
        }
    }

    /// Seconds since the Unix epoch, with millisecond resolution
    pub fn timestamp_secs(&self) -> f64 {
        self.observed_at.timestamp_millis() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payload_format_min_len() {
        assert_eq!(PayloadFormat::Basic.min_len(), 4);
        assert_eq!(PayloadFormat::Auto.min_len(), 4);
        assert_eq!(PayloadFormat::WithBattery.min_len(), 9);
    }

    #[test]
    fn test_payload_format_battery_selection() {
        assert!(!PayloadFormat::Basic.decodes_battery(12));
        assert!(PayloadFormat::WithBattery.decodes_battery(9));
        assert!(!PayloadFormat::Auto.decodes_battery(8));
        assert!(PayloadFormat::Auto.decodes_battery(9));
    }

    #[test]
    fn test_payload_format_parse() {
        assert_eq!("basic".parse::<PayloadFormat>(), Ok(PayloadFormat::Basic));
        assert_eq!(
            "Battery".parse::<PayloadFormat>(),
            Ok(PayloadFormat::WithBattery)
        );
        assert_eq!("auto".parse::<PayloadFormat>(), Ok(PayloadFormat::Auto));
        assert!(matches!(
            "cayenne".parse::<PayloadFormat>(),
            Err(LoraSensorError::UnknownPayloadFormat(_))
        ));
    }

    #[test]
    fn test_payload_format_display_roundtrip() {
        for format in [
            PayloadFormat::Basic,
            PayloadFormat::WithBattery,
            PayloadFormat::Auto,
        ] {
            assert_eq!(format.to_string().parse::<PayloadFormat>(), Ok(format));
        }
    }

    #[test]
    fn test_observation_timestamp() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_250).unwrap();
        let obs = Observation::new(SensorReading::new(21.0, 40.0), at);
        assert_eq!(obs.timestamp_secs(), 1_700_000_000.25);
    }
}
