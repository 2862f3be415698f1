// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telemetry ingest from onboard devices.
//!
//! The signature check runs in `require_device_signature`; by the time a
//! handler here runs, the body has been authenticated.

use crate::error::{AppError, Result};
use crate::models::{Alarm, Reading};
use crate::routes::new_id;
use crate::time_utils::{normalize_input, now_rfc3339};
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ingest/readings", post(ingest_reading))
}

/// One telemetry sample as sent by a device.
#[derive(Debug, Deserialize)]
pub struct ReadingPayload {
    pub vehicle_id: String,
    pub obd_distance: Option<f64>,
    pub gps_distance: Option<f64>,
    pub engine_temp: Option<f64>,
    pub rpm: Option<f64>,
    pub speed: Option<f64>,
    pub battery_voltage: Option<f64>,
    /// Device clock; server time when absent
    pub recorded_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub id: String,
    pub alarms: Vec<Alarm>,
}

async fn ingest_reading(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReadingPayload>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    for (field, value) in [
        ("obd_distance", payload.obd_distance),
        ("gps_distance", payload.gps_distance),
    ] {
        if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err(AppError::BadRequest(format!(
                "'{}' must be a non-negative number",
                field
            )));
        }
    }

    let vehicle = state
        .db
        .get_vehicle(&payload.vehicle_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", payload.vehicle_id)))?;

    let recorded_at = match payload.recorded_at.as_deref() {
        Some(raw) => normalize_input("recorded_at", raw)?,
        None => now_rfc3339(),
    };

    let reading = Reading {
        id: new_id(),
        vehicle_id: vehicle.id.clone(),
        obd_distance: payload.obd_distance,
        gps_distance: payload.gps_distance,
        engine_temp: payload.engine_temp,
        rpm: payload.rpm,
        speed: payload.speed,
        battery_voltage: payload.battery_voltage,
        recorded_at,
    };

    state.db.add_reading(&reading).await?;

    let alarms = vehicle.thresholds.evaluate(&reading);
    if alarms.is_empty() {
        tracing::debug!(vehicle_id = %vehicle.id, reading_id = %reading.id, "Reading stored");
    } else {
        tracing::warn!(
            vehicle_id = %vehicle.id,
            plate = %vehicle.plate,
            alarms = ?alarms,
            "Reading triggered alarms"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            id: reading.id,
            alarms,
        }),
    ))
}
