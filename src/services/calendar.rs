// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Calendar client for mirroring workshop schedules.
//!
//! Handles:
//! - Creating a calendar per workshop
//! - Creating, moving and deleting events for schedules

use crate::error::AppError;
use crate::models::{Maintenance, Schedule, Vehicle};
use crate::services::http::{check_response, check_response_json, transport_error};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "calendar";
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
/// Time zone of calendars created for workshops.
pub const WORKSHOP_TIME_ZONE: &str = "America/Sao_Paulo";

/// Google Calendar API client.
#[derive(Clone)]
pub struct CalendarClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Event body accepted by the Calendar API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: String,
}

#[derive(Deserialize)]
struct CreatedResource {
    id: String,
}

impl CalendarEvent {
    /// Event mirroring a schedule.
    pub fn for_schedule(schedule: &Schedule, maintenance: &Maintenance, vehicle: &Vehicle) -> Self {
        Self {
            summary: format!("{} - {}", maintenance.service, vehicle.plate),
            description: format!(
                "{} {} ({})\nManutenção {}",
                vehicle.brand, vehicle.model, vehicle.year, maintenance.id
            ),
            start: EventTime {
                date_time: schedule.start.clone(),
            },
            end: EventTime {
                date_time: schedule.end.clone(),
            },
        }
    }
}

impl CalendarClient {
    /// Create a client. `token = None` disables the integration.
    pub fn new(token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
        }
    }

    /// Point the client at another API root, such as a local stand-in.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    fn token(&self) -> Result<&str, AppError> {
        self.token
            .as_deref()
            .ok_or_else(|| AppError::Forbidden("calendar integration is not configured".to_string()))
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    /// Create a secondary calendar and return its ID.
    pub async fn create_calendar(&self, summary: &str) -> Result<String, AppError> {
        let body = serde_json::json!({
            "summary": summary,
            "timeZone": WORKSHOP_TIME_ZONE,
        });

        let response = self
            .http
            .post(format!("{}/calendars", self.base_url))
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let created: CreatedResource = check_response_json(SERVICE, response).await?;
        tracing::info!(calendar_id = %created.id, "Calendar created");
        Ok(created.id)
    }

    /// Insert an event and return its ID.
    pub async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .post(self.events_url(calendar_id))
            .bearer_auth(self.token()?)
            .json(event)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let created: CreatedResource = check_response_json(SERVICE, response).await?;
        Ok(created.id)
    }

    /// Replace an event's fields.
    pub async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        );

        let response = self
            .http
            .patch(url)
            .bearer_auth(self.token()?)
            .json(event)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        check_response(SERVICE, response).await
    }

    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        );

        let response = self
            .http
            .delete(url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        check_response(SERVICE, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_for_schedule() {
        let schedule = Schedule {
            id: "s1".to_string(),
            workshop_id: "w1".to_string(),
            maintenance_id: "m1".to_string(),
            vehicle_id: "v1".to_string(),
            start: "2026-06-01T09:00:00Z".to_string(),
            end: "2026-06-01T10:00:00Z".to_string(),
            calendar_event_id: None,
        };
        let maintenance = Maintenance {
            id: "m1".to_string(),
            vehicle_id: "v1".to_string(),
            workshop_id: "w1".to_string(),
            service: "Alinhamento".to_string(),
            price: 90.0,
            km_limit: None,
            date_limit: None,
            done: false,
            created_at: "2026-05-01T00:00:00Z".to_string(),
        };
        let vehicle = Vehicle {
            id: "v1".to_string(),
            owner_id: "d1".to_string(),
            plate: "ABC1D23".to_string(),
            vin: None,
            brand: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2018,
            initial_km: 0.0,
            thresholds: Default::default(),
            created_at: "2026-05-01T00:00:00Z".to_string(),
        };

        let event = CalendarEvent::for_schedule(&schedule, &maintenance, &vehicle);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["summary"], "Alinhamento - ABC1D23");
        assert_eq!(json["start"]["dateTime"], "2026-06-01T09:00:00Z");
        assert_eq!(json["end"]["dateTime"], "2026-06-01T10:00:00Z");
    }

    #[test]
    fn test_calendar_id_is_url_encoded() {
        let client = CalendarClient::new(Some("token".to_string()));
        assert_eq!(
            client.events_url("abc@group.calendar.google.com"),
            "https://www.googleapis.com/calendar/v3/calendars/abc%40group.calendar.google.com/events"
        );
    }

    #[test]
    fn test_disabled_without_token() {
        let client = CalendarClient::new(None);
        assert!(!client.is_enabled());
        assert!(matches!(client.token(), Err(AppError::Forbidden(_))));
    }
}
