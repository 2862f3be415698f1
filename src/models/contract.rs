// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Service contracts: usage limits and notification lead times.

use crate::error::{AppError, Result};
use crate::models::maintenance::LeadTime;
use serde::{Deserialize, Serialize};

/// Contract reference stored on workshops that have no paid contract.
pub const BASIC_CONTRACT_ID: &str = "basic";

/// A named tier of limits applied to a workshop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Document ID (`"basic"` for the built-in tier)
    pub id: String,
    pub name: String,
    /// Drivers that may be associated with the workshop
    pub max_drivers: u32,
    /// Vehicles each driver may own
    pub max_vehicles_per_driver: u32,
    /// Alarm thresholds that may be configured on one vehicle
    pub max_alarms_per_vehicle: u32,
    /// Distance lead time for maintenance notifications (km)
    pub notification_km: u32,
    /// Date lead time for maintenance notifications (days)
    pub notification_days: u32,
    /// Schedules that may start on the same day
    pub max_schedules_per_day: u32,
    /// Free-trial period granting premium features (days)
    pub free_trial_days: u32,
}

impl Contract {
    /// Built-in limits for workshops on the basic tier.
    pub fn basic() -> Self {
        Self {
            id: BASIC_CONTRACT_ID.to_string(),
            name: "Básico".to_string(),
            max_drivers: 5,
            max_vehicles_per_driver: 1,
            max_alarms_per_vehicle: 1,
            notification_km: 500,
            notification_days: 7,
            max_schedules_per_day: 2,
            free_trial_days: 30,
        }
    }

    pub fn is_basic(&self) -> bool {
        self.id == BASIC_CONTRACT_ID
    }

    /// Lead-time offsets used by the maintenance classifier.
    pub fn lead_time(&self) -> LeadTime {
        LeadTime {
            km: f64::from(self.notification_km),
            days: i64::from(self.notification_days),
        }
    }

    /// Check there is room for one more driver.
    pub fn check_driver_capacity(&self, current: usize) -> Result<()> {
        check_capacity(current, self.max_drivers, "drivers per workshop")
    }

    /// Check the owner has room for one more vehicle.
    pub fn check_vehicle_capacity(&self, current: usize) -> Result<()> {
        check_capacity(current, self.max_vehicles_per_driver, "vehicles per driver")
    }

    /// Check a vehicle does not configure more alarms than allowed.
    pub fn check_alarm_count(&self, configured: usize) -> Result<()> {
        if configured > self.max_alarms_per_vehicle as usize {
            return Err(AppError::LimitExceeded(format!(
                "contract '{}' allows {} alarms per vehicle, got {}",
                self.name, self.max_alarms_per_vehicle, configured
            )));
        }
        Ok(())
    }

    /// Check there is room for one more schedule on the same day.
    pub fn check_schedule_capacity(&self, same_day: usize) -> Result<()> {
        check_capacity(same_day, self.max_schedules_per_day, "schedules per day")
    }
}

fn check_capacity(current: usize, max: u32, what: &str) -> Result<()> {
    if current >= max as usize {
        return Err(AppError::LimitExceeded(format!(
            "limit of {} {} reached",
            max, what
        )));
    }
    Ok(())
}
