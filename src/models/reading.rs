// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telemetry reading model.

use serde::{Deserialize, Serialize};

/// Telemetry snapshot reported by a vehicle's onboard device. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Document ID
    pub id: String,
    pub vehicle_id: String,
    /// Distance since device install, from the OBD port (km)
    #[serde(default)]
    pub obd_distance: Option<f64>,
    /// Distance since device install, from GPS (km)
    #[serde(default)]
    pub gps_distance: Option<f64>,
    /// Engine coolant temperature (°C)
    #[serde(default)]
    pub engine_temp: Option<f64>,
    #[serde(default)]
    pub rpm: Option<f64>,
    /// Speed (km/h)
    #[serde(default)]
    pub speed: Option<f64>,
    /// Battery voltage (V)
    #[serde(default)]
    pub battery_voltage: Option<f64>,
    /// When the device took the sample (RFC3339)
    pub recorded_at: String,
}

impl Reading {
    /// Distance travelled, preferring the OBD source over GPS.
    pub fn distance(&self) -> Option<f64> {
        self.obd_distance.or(self.gps_distance)
    }
}
