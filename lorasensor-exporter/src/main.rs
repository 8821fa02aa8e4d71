// LoRa Sensor Exporter - Prometheus exporter for RisingHF LoRaWAN sensors
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # LoRa Sensor Exporter
//!
//! Receives The Things Network uplink webhooks (v2 and v3 integrations),
//! decodes RisingHF RHF1S001 temperature/humidity payloads and exposes the
//! latest reading of every sensor on `/metrics`.
//!
//! ## Usage
//!
//! ```bash
//! # Listen on all IPv6 interfaces, port 8047
//! lorasensor-exporter
//!
//! # Localhost only, custom port, sensors with a battery byte
//! lorasensor-exporter --listen-address 127.0.0.1 --port 9100 --payload-format battery
//! ```

mod config;
mod error;
mod metrics;
mod webhook;

use clap::Parser;
use config::ExporterConfig;
use error::Result;
use lorasensor::PayloadFormat;
use metrics::GaugeStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;
use webhook::AppState;

/// LoRa sensor Prometheus exporter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address to listen on
    #[arg(short, long, default_value = config::DEFAULT_LISTEN_ADDRESS)]
    listen_address: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Device id prefix of tracked sensors
    #[arg(long, default_value = lorasensor::envelope::DEFAULT_DEVICE_PREFIX)]
    device_prefix: String,

    /// LoRaWAN application port carrying sensor data
    #[arg(long, default_value_t = lorasensor::envelope::DEFAULT_F_PORT)]
    f_port: u8,

    /// Payload format (auto, basic, battery)
    #[arg(long, default_value = "auto")]
    payload_format: PayloadFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for ExporterConfig {
    fn from(args: Args) -> Self {
        Self {
            listen_address: args.listen_address,
            port: args.port,
            device_prefix: args.device_prefix,
            f_port: args.f_port,
            payload_format: args.payload_format,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("LoRa Sensor Exporter v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(ExporterConfig::from(args)).await {
        error!("Exporter failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: ExporterConfig) -> Result<()> {
    config.validate()?;
    info!(
        config = %serde_json::to_string(&config).unwrap_or_default(),
        "Configuration loaded"
    );

    let state = Arc::new(AppState::new(
        GaugeStore::new()?,
        config.interest_filter(),
        config.decoder(),
    ));
    let app = webhook::router(state);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Webhook endpoint: http://{}/", addr);
    info!("Metrics endpoint: http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down gracefully");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["lorasensor-exporter"]);
        let config = ExporterConfig::from(args);
        assert_eq!(config, ExporterConfig::default());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "lorasensor-exporter",
            "--listen-address",
            "127.0.0.1",
            "--port",
            "9100",
            "--device-prefix",
            "lab-",
            "--f-port",
            "2",
            "--payload-format",
            "battery",
        ]);
        let config = ExporterConfig::from(args);

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9100");
        assert_eq!(config.device_prefix, "lab-");
        assert_eq!(config.f_port, 2);
        assert_eq!(config.payload_format, PayloadFormat::WithBattery);
    }

    #[test]
    fn test_args_reject_unknown_format() {
        let result = Args::try_parse_from(["lorasensor-exporter", "--payload-format", "lpp"]);
        assert!(result.is_err());
    }
}
