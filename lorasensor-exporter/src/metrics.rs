// LoRa Sensor Exporter - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-device gauge store.
//!
//! Holds the last observation of every sensor as Prometheus gauges labelled
//! by device id. Series are created on first sighting of a device and kept
//! for the lifetime of the process.

use lorasensor::Observation;
use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Label carrying the device id on every sensor gauge
pub const DEVICE_LABEL: &str = "device";

/// Gauges exposed per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Temperature in °C.
    Temperature,
    /// Relative humidity in %.
    Humidity,
    /// Battery voltage in V.
    Battery,
    /// Unix time of the last accepted uplink.
    DataTimestamp,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Temperature => "lorasensor_temperature_celsius",
            Metric::Humidity => "lorasensor_humidity_percent",
            Metric::Battery => "lorasensor_battery_volts",
            Metric::DataTimestamp => "lorasensor_data_timestamp_seconds",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature from the sensor",
            Metric::Humidity => "Relative humidity from the sensor",
            Metric::Battery => "Battery voltage reported by the sensor",
            Metric::DataTimestamp => "Unix time of the last uplink accepted from the sensor",
        }
    }
}

/// What happened to one webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Decoded and stored.
    Accepted,
    /// Not from a tracked sensor, or ambiguous.
    Ignored,
    /// From a tracked sensor but undecodable.
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Ignored => "ignored",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Last-value gauges for every device seen so far.
///
/// Each `set`, `record` and `render` call is atomic with respect to the
/// others, so a scrape never observes half of an uplink.
pub struct GaugeStore {
    registry: Registry,
    temperature: GaugeVec,
    humidity: GaugeVec,
    battery: GaugeVec,
    data_timestamp: GaugeVec,
    uplinks: IntCounterVec,
    // Devices with at least one series; also serializes writers against scrapes.
    devices: RwLock<HashSet<String>>,
}

impl GaugeStore {
    /// Create an empty store with its own registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let gauge = |metric: Metric| -> prometheus::Result<GaugeVec> {
            let vec = GaugeVec::new(Opts::new(metric.name(), metric.help()), &[DEVICE_LABEL])?;
            registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        };

        let temperature = gauge(Metric::Temperature)?;
        let humidity = gauge(Metric::Humidity)?;
        let battery = gauge(Metric::Battery)?;
        let data_timestamp = gauge(Metric::DataTimestamp)?;

        let uplinks = IntCounterVec::new(
            Opts::new(
                "lorasensor_uplinks_total",
                "Webhook deliveries received, by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(uplinks.clone()))?;

        Ok(Self {
            registry,
            temperature,
            humidity,
            battery,
            data_timestamp,
            uplinks,
            devices: RwLock::new(HashSet::new()),
        })
    }

    fn gauge(&self, metric: Metric) -> &GaugeVec {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
            Metric::Battery => &self.battery,
            Metric::DataTimestamp => &self.data_timestamp,
        }
    }

    // Caller holds the write lock.
    fn set_locked(&self, metric: Metric, device_id: &str, value: f64) {
        self.gauge(metric).with_label_values(&[device_id]).set(value);
    }

    /// Overwrite one metric of one device.
    ///
    /// The webhook path goes through [`GaugeStore::record`]; this is the
    /// single-value form of the same write.
    #[allow(dead_code)]
    pub fn set(&self, metric: Metric, device_id: &str, value: f64) {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        self.set_locked(metric, device_id, value);
        if !devices.contains(device_id) {
            devices.insert(device_id.to_owned());
        }
    }

    /// Store every value of an observation for one device.
    ///
    /// Returns `true` when this is the first observation stored for the device.
    pub fn record(&self, device_id: &str, observation: &Observation) -> bool {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let reading = &observation.reading;

        self.set_locked(Metric::Temperature, device_id, reading.temperature);
        self.set_locked(Metric::Humidity, device_id, reading.humidity);
        if let Some(battery) = reading.battery {
            self.set_locked(Metric::Battery, device_id, battery);
        }
        self.set_locked(
            Metric::DataTimestamp,
            device_id,
            observation.timestamp_secs(),
        );

        if devices.contains(device_id) {
            false
        } else {
            devices.insert(device_id.to_owned())
        }
    }

    /// Count one webhook delivery.
    pub fn count_uplink(&self, outcome: Outcome) {
        self.uplinks.with_label_values(&[outcome.as_str()]).inc();
    }

    /// Current value of one metric for one device, without creating the series.
    #[allow(dead_code)]
    pub fn get(&self, metric: Metric, device_id: &str) -> Option<f64> {
        let _guard = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        self.gauge(metric)
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|m| {
                m.get_label()
                    .iter()
                    .any(|l| l.get_name() == DEVICE_LABEL && l.get_value() == device_id)
            })
            .map(|m| m.get_gauge().get_value())
    }

    /// Number of devices with at least one stored reading.
    pub fn device_count(&self) -> usize {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Encode all series to Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let families = {
            let _guard = self.devices.read().unwrap_or_else(PoisonError::into_inner);
            self.registry.gather()
        };

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Content type of [`GaugeStore::render`] output.
pub fn content_type() -> &'static str {
    prometheus::TEXT_FORMAT
}
