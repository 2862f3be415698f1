// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vehicle model, alarm thresholds and alarm evaluation.

use crate::models::Reading;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A vehicle owned by a driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Document ID
    pub id: String,
    /// Owning driver ID
    pub owner_id: String,
    /// License plate, normalized (see [`normalize_plate`])
    pub plate: String,
    #[serde(default)]
    pub vin: Option<String>,
    pub brand: String,
    pub model: String,
    pub year: u16,
    /// Odometer value when the telemetry device was installed (km)
    pub initial_km: f64,
    #[serde(default)]
    pub thresholds: AlarmThresholds,
    pub created_at: String,
}

impl Vehicle {
    /// Current odometer value given the latest reading, if any.
    pub fn current_km(&self, latest: Option<&Reading>) -> f64 {
        self.initial_km + latest.and_then(Reading::distance).unwrap_or(0.0)
    }
}

/// Telemetry limits that raise alarms. Unset limits never alarm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AlarmThresholds {
    #[serde(default)]
    pub max_engine_temp: Option<f64>,
    #[serde(default)]
    pub max_rpm: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub min_battery_voltage: Option<f64>,
}

/// Which threshold an alarm tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    EngineTemp,
    Rpm,
    Speed,
    BatteryVoltage,
}

/// A tripped threshold with the offending value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Alarm {
    pub kind: AlarmKind,
    pub value: f64,
    pub limit: f64,
}

impl AlarmThresholds {
    /// Number of thresholds set (counted against the contract's alarm limit).
    pub fn configured_count(&self) -> usize {
        [
            self.max_engine_temp,
            self.max_rpm,
            self.max_speed,
            self.min_battery_voltage,
        ]
        .iter()
        .filter(|t| t.is_some())
        .count()
    }

    /// Evaluate a reading against these thresholds.
    pub fn evaluate(&self, reading: &Reading) -> Vec<Alarm> {
        let above = [
            (AlarmKind::EngineTemp, reading.engine_temp, self.max_engine_temp),
            (AlarmKind::Rpm, reading.rpm, self.max_rpm),
            (AlarmKind::Speed, reading.speed, self.max_speed),
        ];

        let mut alarms: Vec<Alarm> = above
            .into_iter()
            .filter_map(|(kind, value, limit)| match (value, limit) {
                (Some(value), Some(limit)) if value > limit => Some(Alarm { kind, value, limit }),
                _ => None,
            })
            .collect();

        if let (Some(value), Some(limit)) = (reading.battery_voltage, self.min_battery_voltage) {
            if value < limit {
                alarms.push(Alarm {
                    kind: AlarmKind::BatteryVoltage,
                    value,
                    limit,
                });
            }
        }

        alarms
    }
}

/// Normalize a license plate for storage and uniqueness checks.
///
/// Uppercases and drops anything that is not an ASCII letter or digit, so
/// `abc-1d23` and `ABC1D23` compare equal.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
