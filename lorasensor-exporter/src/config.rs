// LoRa Sensor Exporter - Startup configuration
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for the exporter

use crate::error::{ExporterError, Result};
use lorasensor::envelope::{DEFAULT_DEVICE_PREFIX, DEFAULT_F_PORT};
use lorasensor::{Decoder, InterestFilter, PayloadFormat};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};

/// Default listen address (all IPv6 interfaces)
pub const DEFAULT_LISTEN_ADDRESS: &str = "::";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8047;

/// Exporter configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExporterConfig {
    /// IP address to bind (IPv4 or IPv6 literal)
    pub listen_address: String,

    /// TCP port to bind
    pub port: u16,

    /// Only devices whose id starts with this prefix are tracked
    pub device_prefix: String,

    /// Only uplinks on this application port are tracked
    pub f_port: u8,

    /// Payload layout expected from the sensors
    #[serde(serialize_with = "serialize_format")]
    pub payload_format: PayloadFormat,
}

fn serialize_format<S: serde::Serializer>(
    format: &PayloadFormat,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(format.as_str())
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            device_prefix: DEFAULT_DEVICE_PREFIX.to_string(),
            f_port: DEFAULT_F_PORT,
            payload_format: PayloadFormat::default(),
        }
    }
}

impl ExporterConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ExporterError::InvalidConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        self.listen_ip()?;

        if self.device_prefix.is_empty() {
            return Err(ExporterError::InvalidConfig(
                "device prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(self.listen_ip()?, self.port))
    }

    pub fn interest_filter(&self) -> InterestFilter {
        InterestFilter::new(self.device_prefix.clone(), self.f_port)
    }

    pub fn decoder(&self) -> Decoder {
        Decoder::with_format(self.payload_format)
    }

    fn listen_ip(&self) -> Result<IpAddr> {
        self.listen_address.parse().map_err(|_| {
            ExporterError::InvalidConfig(format!(
                "listen address {} is not an IP address",
                self.listen_address
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ExporterConfig::default();
        assert_eq!(config.listen_address, "::");
        assert_eq!(config.port, 8047);
        assert_eq!(config.device_prefix, "risinghf");
        assert_eq!(config.f_port, 8);
        assert_eq!(config.payload_format, PayloadFormat::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ExporterConfig::default();

        config.port = 0;
        assert!(config.validate().is_err());
        config.port = 8047;

        config.listen_address = "localhost".to_string();
        assert!(matches!(
            config.validate(),
            Err(ExporterError::InvalidConfig(_))
        ));
        config.listen_address = "0.0.0.0".to_string();
        assert!(config.validate().is_ok());

        config.device_prefix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = ExporterConfig::default().socket_addr().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 8047);

        let config = ExporterConfig {
            listen_address: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_derived_components() {
        let config = ExporterConfig {
            device_prefix: "lab-".to_string(),
            f_port: 2,
            payload_format: PayloadFormat::WithBattery,
            ..Default::default()
        };

        let filter = config.interest_filter();
        assert_eq!(filter.device_prefix(), "lab-");
        assert_eq!(filter.f_port(), 2);
        assert_eq!(config.decoder().format(), PayloadFormat::WithBattery);
    }

    #[test]
    fn test_config_serializes_for_startup_log() {
        let json = serde_json::to_value(ExporterConfig::default()).unwrap();
        assert_eq!(json["payload_format"], "auto");
        assert_eq!(json["port"], 8047);
    }
}
