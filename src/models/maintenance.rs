// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maintenance items and their derived due status.

use crate::time_utils::parse_utc;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A tracked service item for one vehicle, owned by one workshop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maintenance {
    /// Document ID
    pub id: String,
    pub vehicle_id: String,
    pub workshop_id: String,
    /// Service name (e.g. "Troca de óleo")
    pub service: String,
    pub price: f64,
    /// Odometer value (km) at which the service is due
    #[serde(default)]
    pub km_limit: Option<f64>,
    /// Date at which the service is due (RFC3339)
    #[serde(default)]
    pub date_limit: Option<String>,
    /// Whether the service has been carried out
    #[serde(default)]
    pub done: bool,
    pub created_at: String,
}

impl Maintenance {
    /// Parsed date limit. Unparseable stored values count as unset.
    pub fn date_limit_utc(&self) -> Option<DateTime<Utc>> {
        self.date_limit.as_deref().and_then(parse_utc)
    }

    /// Derive the due status of this maintenance.
    pub fn status(&self, current_km: f64, lead: LeadTime, now: DateTime<Utc>) -> MaintenanceStatus {
        classify(self.km_limit, self.date_limit_utc(), current_km, lead, now)
    }
}

/// Due status of a maintenance. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    /// Comfortably within both limits
    Upcoming,
    /// Inside the notification window of a limit
    Approaching,
    /// Past a limit
    Overdue,
}

/// Notification lead times taken from the workshop's contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadTime {
    /// Distance offset (km) before `km_limit`
    pub km: f64,
    /// Day offset before `date_limit`
    pub days: i64,
}

/// Classify a maintenance against its limits.
///
/// Date limit takes precedence over distance limit; within each limit the
/// overdue check runs before the approaching check.
pub fn classify(
    km_limit: Option<f64>,
    date_limit: Option<DateTime<Utc>>,
    current_km: f64,
    lead: LeadTime,
    now: DateTime<Utc>,
) -> MaintenanceStatus {
    if let Some(limit) = date_limit {
        if now >= limit {
            return MaintenanceStatus::Overdue;
        }
        let window_start = limit
            .checked_sub_signed(Duration::days(lead.days.max(0)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        if window_start <= now {
            return MaintenanceStatus::Approaching;
        }
    }

    if let Some(limit) = km_limit {
        if current_km >= limit {
            return MaintenanceStatus::Overdue;
        }
        if current_km >= (limit - lead.km.max(0.0)).max(0.0) {
            return MaintenanceStatus::Approaching;
        }
    }

    MaintenanceStatus::Upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    const LEAD: LeadTime = LeadTime {
        km: 1000.0,
        days: 7,
    };

    #[test]
    fn test_no_limits_is_upcoming() {
        for km in [0.0, 9_999.0, 1_000_000.0] {
            assert_eq!(
                classify(None, None, km, LEAD, now()),
                MaintenanceStatus::Upcoming
            );
        }
    }

    #[test]
    fn test_distance_table() {
        let cases = [
            (5_000.0, MaintenanceStatus::Upcoming),
            (8_999.9, MaintenanceStatus::Upcoming),
            (9_000.0, MaintenanceStatus::Approaching),
            (9_500.0, MaintenanceStatus::Approaching),
            (10_000.0, MaintenanceStatus::Overdue),
            (10_500.0, MaintenanceStatus::Overdue),
        ];
        for (current, expected) in cases {
            assert_eq!(
                classify(Some(10_000.0), None, current, LEAD, now()),
                expected,
                "current_km = {}",
                current
            );
        }
    }

    #[test]
    fn test_past_date_is_overdue_regardless_of_distance() {
        let yesterday = now() - Duration::days(1);
        assert_eq!(
            classify(Some(10_000.0), Some(yesterday), 0.0, LEAD, now()),
            MaintenanceStatus::Overdue
        );
        assert_eq!(
            classify(None, Some(now()), 0.0, LEAD, now()),
            MaintenanceStatus::Overdue
        );
    }

    #[test]
    fn test_date_inside_window_is_approaching() {
        let in_three_days = now() + Duration::days(3);
        let exactly_at_window = now() + Duration::days(7);
        assert_eq!(
            classify(None, Some(in_three_days), 0.0, LEAD, now()),
            MaintenanceStatus::Approaching
        );
        assert_eq!(
            classify(None, Some(exactly_at_window), 0.0, LEAD, now()),
            MaintenanceStatus::Approaching
        );
    }

    #[test]
    fn test_date_precedes_distance() {
        // Far-off date does not mask an overdue odometer.
        let next_year = now() + Duration::days(365);
        assert_eq!(
            classify(Some(10_000.0), Some(next_year), 10_500.0, LEAD, now()),
            MaintenanceStatus::Overdue
        );
        // Approaching date wins over a comfortable odometer.
        let soon = now() + Duration::days(2);
        assert_eq!(
            classify(Some(10_000.0), Some(soon), 100.0, LEAD, now()),
            MaintenanceStatus::Approaching
        );
    }

    #[test]
    fn test_offset_larger_than_limit_saturates() {
        let lead = LeadTime {
            km: 50_000.0,
            days: 7,
        };
        assert_eq!(
            classify(Some(1_000.0), None, 0.0, lead, now()),
            MaintenanceStatus::Approaching
        );
    }

    #[test]
    fn test_unparseable_date_limit_is_ignored() {
        let maintenance = Maintenance {
            id: "m1".to_string(),
            vehicle_id: "v1".to_string(),
            workshop_id: "w1".to_string(),
            service: "Troca de óleo".to_string(),
            price: 180.0,
            km_limit: None,
            date_limit: Some("not a date".to_string()),
            done: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(
            maintenance.status(0.0, LEAD, now()),
            MaintenanceStatus::Upcoming
        );
    }
}
