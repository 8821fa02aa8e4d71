//! Webhook envelopes from The Things Network
//!
//! TTN v2 (`dev_id` / `port` / `payload_raw`) and TTN v3
//! (`end_device_ids.device_id` / `uplink_message.f_port` /
//! `uplink_message.frm_payload`) deliveries are both accepted on the same
//! endpoint. Each schema has its own parser returning `Option`; a missing or
//! mistyped field only means "not this schema".

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Device id prefix of the RisingHF sensors
pub const DEFAULT_DEVICE_PREFIX: &str = "risinghf";

/// Application port carrying the temperature/humidity payload
pub const DEFAULT_F_PORT: u8 = 8;

/// TTN webhook schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    V2,
    V3,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::V2 => write!(f, "v2"),
            SchemaVersion::V3 => write!(f, "v3"),
        }
    }
}

/// Schema-independent view of one uplink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uplink {
    pub device_id: String,
    pub port: i64,
    /// Base64 application payload
    pub payload: String,
}

#[derive(Deserialize)]
struct V2Uplink {
    dev_id: String,
    port: i64,
    payload_raw: String,
}

#[derive(Deserialize)]
struct V3Uplink {
    end_device_ids: V3DeviceIds,
    uplink_message: V3UplinkMessage,
}

#[derive(Deserialize)]
struct V3DeviceIds {
    device_id: String,
}

#[derive(Deserialize)]
struct V3UplinkMessage {
    f_port: i64,
    frm_payload: String,
}

impl From<V2Uplink> for Uplink {
    fn from(v2: V2Uplink) -> Self {
        Self {
            device_id: v2.dev_id,
            port: v2.port,
            payload: v2.payload_raw,
        }
    }
}

impl From<V3Uplink> for Uplink {
    fn from(v3: V3Uplink) -> Self {
        Self {
            device_id: v3.end_device_ids.device_id,
            port: v3.uplink_message.f_port,
            payload: v3.uplink_message.frm_payload,
        }
    }
}

/// A parsed webhook body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    V2(Uplink),
    V3(Uplink),
    /// Both schemas are structurally present in the same document
    Ambiguous { v2: Uplink, v3: Uplink },
    /// Neither schema is present
    Unrecognized,
}

impl Envelope {
    /// Classify a JSON document by schema
    pub fn parse(value: &Value) -> Self {
        // serde would also accept a positional array for a struct
        if !value.is_object() {
            return Envelope::Unrecognized;
        }

        let v2 = V2Uplink::deserialize(value).ok().map(Uplink::from);
        let v3 = V3Uplink::deserialize(value).ok().map(Uplink::from);

        match (v2, v3) {
            (Some(v2), Some(v3)) => Envelope::Ambiguous { v2, v3 },
            (Some(v2), None) => Envelope::V2(v2),
            (None, Some(v3)) => Envelope::V3(v3),
            (None, None) => Envelope::Unrecognized,
        }
    }

    /// Parse a raw JSON body
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self::parse(&value))
    }

    /// The single uplink of an unambiguous envelope
    pub fn uplink(&self) -> Option<(SchemaVersion, &Uplink)> {
        match self {
            Envelope::V2(uplink) => Some((SchemaVersion::V2, uplink)),
            Envelope::V3(uplink) => Some((SchemaVersion::V3, uplink)),
            Envelope::Ambiguous { .. } | Envelope::Unrecognized => None,
        }
    }
}

/// Outcome of running an envelope through the [`InterestFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest<'a> {
    /// Uplink from a tracked sensor on the tracked port
    Match {
        version: SchemaVersion,
        uplink: &'a Uplink,
    },
    /// Both schemas present and at least one of them would match
    Ambiguous,
    /// Anything else
    Ignored,
}

/// Selects uplinks by device id prefix and application port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestFilter {
    device_prefix: String,
    f_port: u8,
}

impl Default for InterestFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_PREFIX, DEFAULT_F_PORT)
    }
}

impl InterestFilter {
    pub fn new(device_prefix: impl Into<String>, f_port: u8) -> Self {
        Self {
            device_prefix: device_prefix.into(),
            f_port,
        }
    }

    pub fn device_prefix(&self) -> &str {
        &self.device_prefix
    }

    pub fn f_port(&self) -> u8 {
        self.f_port
    }

    /// Returns true iff this uplink should not be ignored
    pub fn is_interesting(&self, uplink: &Uplink) -> bool {
        uplink.device_id.starts_with(&self.device_prefix) && uplink.port == i64::from(self.f_port)
    }

    pub fn classify<'a>(&self, envelope: &'a Envelope) -> Interest<'a> {
        match envelope {
            Envelope::V2(uplink) if self.is_interesting(uplink) => Interest::Match {
                version: SchemaVersion::V2,
                uplink,
            },
            Envelope::V3(uplink) if self.is_interesting(uplink) => Interest::Match {
                version: SchemaVersion::V3,
                uplink,
            },
            Envelope::Ambiguous { v2, v3 } if self.is_interesting(v2) || self.is_interesting(v3) => {
                Interest::Ambiguous
            }
            _ => Interest::Ignored,
        }
    }
}
