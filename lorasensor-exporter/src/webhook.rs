// LoRa Sensor Exporter - HTTP endpoints
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! TTN webhook ingestion and Prometheus scrape endpoints.
//!
//! - `POST /`: TTN v2 / v3 uplink webhook
//! - `GET /metrics`: Prometheus text exposition
//! - `GET /health`: liveness probe

use crate::metrics::{content_type, GaugeStore, Outcome};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use lorasensor::{Decoder, Envelope, Interest, InterestFilter, LoraSensorError, Observation};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Application state shared across handlers.
pub struct AppState {
    pub store: GaugeStore,
    pub filter: InterestFilter,
    pub decoder: Decoder,
}

impl AppState {
    pub fn new(store: GaugeStore, filter: InterestFilter, decoder: Decoder) -> Self {
        Self {
            store,
            filter,
            decoder,
        }
    }

    /// Run one envelope through filter, decoder and store.
    pub fn process(&self, envelope: &Envelope, now: DateTime<Utc>) -> Result<Outcome, WebhookError> {
        let (version, uplink) = match self.filter.classify(envelope) {
            Interest::Match { version, uplink } => (version, uplink),
            Interest::Ambiguous => {
                warn!("Webhook carries both v2 and v3 uplink fields, ignoring");
                self.store.count_uplink(Outcome::Ignored);
                return Ok(Outcome::Ignored);
            }
            Interest::Ignored => {
                debug!("Ignoring uninteresting webhook");
                self.store.count_uplink(Outcome::Ignored);
                return Ok(Outcome::Ignored);
            }
        };

        let reading = match self.decoder.decode(&uplink.payload) {
            Ok(reading) => reading,
            Err(e) => {
                warn!(device = %uplink.device_id, schema = %version, error = %e, "Failed to decode payload");
                self.store.count_uplink(Outcome::Rejected);
                return Err(WebhookError::Decode {
                    device_id: uplink.device_id.clone(),
                    source: e,
                });
            }
        };

        info!(
            device = %uplink.device_id,
            schema = %version,
            temperature = reading.temperature,
            humidity = reading.humidity,
            battery = ?reading.battery,
            "Device sent payload"
        );

        if self
            .store
            .record(&uplink.device_id, &Observation::new(reading, now))
        {
            info!(
                device = %uplink.device_id,
                devices = self.store.device_count(),
                "New device tracked"
            );
        }
        self.store.count_uplink(Outcome::Accepted);
        Ok(Outcome::Accepted)
    }
}

/// Build the router serving all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(webhook_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Body returned to the network server.
#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }
}

/// Request failures surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Request body is not JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to decode payload of {device_id}: {source}")]
    Decode {
        device_id: String,
        source: LoraSensorError,
    },

    #[error("Failed to encode metrics: {0}")]
    Render(#[from] prometheus::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match self {
            WebhookError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            WebhookError::Decode { .. } | WebhookError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = WebhookResponse {
            success: false,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Webhook handler - decodes tracked uplinks into the gauge store.
///
/// The body is parsed as JSON whatever `Content-Type` the sender declared.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Webhook body is not JSON");
        e
    })?;
    let envelope = Envelope::parse(&body);
    state.process(&envelope, Utc::now())?;
    Ok(Json(WebhookResponse::ok()))
}

/// Metrics handler - returns Prometheus text format.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, WebhookError> {
    let metrics = state.store.render()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type())],
        metrics,
    ))
}

/// Health check handler.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
