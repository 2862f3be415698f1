// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar bookings of a maintenance at a workshop.

use serde::{Deserialize, Serialize};

/// A booked time window for carrying out a maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Document ID
    pub id: String,
    pub workshop_id: String,
    pub maintenance_id: String,
    pub vehicle_id: String,
    /// Window start (RFC3339, storage format)
    pub start: String,
    /// Window end, exclusive (RFC3339, storage format)
    pub end: String,
    /// Mirrored event in the workshop's external calendar
    #[serde(default)]
    pub calendar_event_id: Option<String>,
}

impl Schedule {
    /// Whether this booking overlaps `[start, end)`.
    ///
    /// Both bounds must be in storage format so string order is time order.
    pub fn overlaps(&self, start: &str, end: &str) -> bool {
        self.start.as_str() < end && self.end.as_str() > start
    }
}

/// First existing booking that overlaps `[start, end)`, ignoring `exclude_id`.
pub fn find_conflict<'a>(
    existing: &'a [Schedule],
    start: &str,
    end: &str,
    exclude_id: Option<&str>,
) -> Option<&'a Schedule> {
    existing
        .iter()
        .filter(|s| Some(s.id.as_str()) != exclude_id)
        .find(|s| s.overlaps(start, end))
}
