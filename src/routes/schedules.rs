// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workshop bookings, mirrored to the workshop's external calendar.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::schedule::find_conflict;
use crate::models::Schedule;
use crate::routes::{new_id, scope_of, validated, DeletedResponse};
use crate::services::calendar::CalendarEvent;
use crate::services::scope::{load_maintenance, visible_vehicles};
use crate::services::Scope;
use crate::time_utils::{normalize_input, parse_utc, utc_day_bounds};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::Utc;
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

const MAX_CONCURRENT_DB_OPS: usize = 20;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/api/schedules/{id}",
            put(update_schedule).delete(delete_schedule),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, message = "maintenance_id is required"))]
    pub maintenance_id: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveScheduleRequest {
    pub start: String,
    pub end: String,
}

/// Validated `[start, end)` window in storage format.
fn window(start: &str, end: &str) -> Result<(String, String)> {
    let start = normalize_input("start", start)?;
    let end = normalize_input("end", end)?;
    if start >= end {
        return Err(AppError::BadRequest(
            "start must be before end".to_string(),
        ));
    }
    Ok((start, end))
}

/// Reject a window that overlaps another booking of the workshop or would
/// exceed the contract's bookings per day.
async fn check_availability(
    state: &AppState,
    workshop_id: &str,
    start: &str,
    end: &str,
    exclude_id: Option<&str>,
) -> Result<()> {
    let earlier = state
        .db
        .list_schedules_starting_between(workshop_id, None, end)
        .await?;
    if let Some(conflict) = find_conflict(&earlier, start, end, exclude_id) {
        return Err(AppError::Conflict(format!(
            "overlaps booking {} ({} - {})",
            conflict.id, conflict.start, conflict.end
        )));
    }

    let day = parse_utc(start).ok_or_else(|| {
        AppError::BadRequest("start must be an RFC3339 datetime".to_string())
    })?;
    let (day_start, day_end) = utc_day_bounds(day);
    let (same_day, contract) = tokio::try_join!(
        state
            .db
            .list_schedules_starting_between(workshop_id, Some(&day_start), &day_end),
        state.db.contract_for_workshop(Some(workshop_id))
    )?;
    let same_day = same_day
        .iter()
        .filter(|s| Some(s.id.as_str()) != exclude_id)
        .count();
    contract.check_schedule_capacity(same_day)
}

/// Calendar to mirror a workshop's bookings into, if mirroring applies.
async fn mirror_calendar(state: &AppState, workshop_id: &str) -> Result<Option<String>> {
    let Some(workshop) = state.db.get_workshop(workshop_id).await? else {
        return Ok(None);
    };
    let Some(calendar_id) = workshop.calendar_id.clone() else {
        return Ok(None);
    };
    if !state.calendar.is_enabled() {
        tracing::debug!(workshop_id, "Calendar integration disabled, not mirroring");
        return Ok(None);
    }
    let contract = state.db.resolve_contract(&workshop).await?;
    if !workshop.is_premium(&contract, Utc::now()) {
        return Ok(None);
    }
    Ok(Some(calendar_id))
}

/// Delete a booking and, best effort, its calendar event.
pub(crate) async fn remove_schedule(state: &AppState, schedule: &Schedule) -> Result<()> {
    if schedule.calendar_event_id.is_some() {
        if let Some(calendar_id) = mirror_calendar(state, &schedule.workshop_id).await? {
            drop_calendar_event(state, &calendar_id, schedule).await;
        }
    }

    state.db.delete_schedule(&schedule.id).await?;
    tracing::info!(schedule_id = %schedule.id, "Schedule deleted");
    Ok(())
}

/// Delete the mirrored events of every booking of a workshop.
///
/// Returns how many events were attempted. Failures are logged only.
pub(crate) async fn release_calendar_events(state: &AppState, workshop_id: &str) -> Result<usize> {
    let Some(calendar_id) = mirror_calendar(state, workshop_id).await? else {
        return Ok(0);
    };
    let schedules = state.db.list_schedules_for_workshop(workshop_id).await?;
    let mirrored: Vec<&Schedule> = schedules
        .iter()
        .filter(|s| s.calendar_event_id.is_some())
        .collect();

    let calendar_id = calendar_id.as_str();
    stream::iter(mirrored.iter().copied())
        .for_each_concurrent(MAX_CONCURRENT_DB_OPS, |schedule| {
            drop_calendar_event(state, calendar_id, schedule)
        })
        .await;
    Ok(mirrored.len())
}

async fn drop_calendar_event(state: &AppState, calendar_id: &str, schedule: &Schedule) {
    let Some(event_id) = schedule.calendar_event_id.as_deref() else {
        return;
    };
    if let Err(e) = state.calendar.delete_event(calendar_id, event_id).await {
        tracing::warn!(
            schedule_id = %schedule.id,
            event_id,
            error = %e,
            "Failed to delete calendar event"
        );
    }
}

/// Load a schedule visible to `scope`.
async fn load_schedule(state: &AppState, scope: &Scope, schedule_id: &str) -> Result<Schedule> {
    let not_found = || AppError::NotFound(format!("Schedule {} not found", schedule_id));

    let schedule = state
        .db
        .get_schedule(schedule_id)
        .await?
        .ok_or_else(not_found)?;

    let visible = match scope {
        Scope::Driver(d) => state
            .db
            .get_vehicle(&schedule.vehicle_id)
            .await?
            .is_some_and(|v| &v.owner_id == d),
        _ => scope.manages_workshop(&schedule.workshop_id),
    };
    if !visible {
        return Err(not_found());
    }
    Ok(schedule)
}

async fn list_schedules(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Schedule>>> {
    let scope = scope_of(&user)?;

    let mut schedules = match &scope {
        Scope::All => state.db.list_schedules().await?,
        Scope::Workshop(w) => state.db.list_schedules_for_workshop(w).await?,
        Scope::Driver(_) => {
            let vehicles = visible_vehicles(&state.db, &scope).await?;
            let db = &state.db;
            let per_vehicle: Vec<Vec<Schedule>> = stream::iter(vehicles)
                .map(|(vehicle, _)| async move {
                    db.list_schedules_for_vehicle(&vehicle.id).await
                })
                .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                .try_collect()
                .await?;
            per_vehicle.into_iter().flatten().collect()
        }
    };
    schedules.sort_by(|a, b| a.start.cmp(&b.start));

    Ok(Json(schedules))
}

async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Schedule>)> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;
    let (start, end) = window(&body.start, &body.end)?;

    let (maintenance, vehicle) = load_maintenance(&state.db, &scope, &body.maintenance_id).await?;
    scope.require_manager(&maintenance.workshop_id)?;

    check_availability(&state, &maintenance.workshop_id, &start, &end, None).await?;

    let mut schedule = Schedule {
        id: new_id(),
        workshop_id: maintenance.workshop_id.clone(),
        maintenance_id: maintenance.id.clone(),
        vehicle_id: vehicle.id.clone(),
        start,
        end,
        calendar_event_id: None,
    };

    // The event is created before the booking is stored; a calendar
    // failure leaves nothing behind.
    if let Some(calendar_id) = mirror_calendar(&state, &schedule.workshop_id).await? {
        let event = CalendarEvent::for_schedule(&schedule, &maintenance, &vehicle);
        schedule.calendar_event_id = Some(state.calendar.insert_event(&calendar_id, &event).await?);
    }

    state.db.upsert_schedule(&schedule).await?;

    tracing::info!(
        schedule_id = %schedule.id,
        workshop_id = %schedule.workshop_id,
        start = %schedule.start,
        mirrored = schedule.calendar_event_id.is_some(),
        "Schedule created"
    );
    Ok((StatusCode::CREATED, Json(schedule)))
}

async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(schedule_id): Path<String>,
    Json(body): Json<MoveScheduleRequest>,
) -> Result<Json<Schedule>> {
    let scope = scope_of(&user)?;
    let (start, end) = window(&body.start, &body.end)?;

    let mut schedule = load_schedule(&state, &scope, &schedule_id).await?;
    scope.require_manager(&schedule.workshop_id)?;

    check_availability(
        &state,
        &schedule.workshop_id,
        &start,
        &end,
        Some(&schedule.id),
    )
    .await?;

    schedule.start = start;
    schedule.end = end;

    if let Some(event_id) = schedule.calendar_event_id.clone() {
        if let Some(calendar_id) = mirror_calendar(&state, &schedule.workshop_id).await? {
            let (maintenance, vehicle) =
                load_maintenance(&state.db, &scope, &schedule.maintenance_id).await?;
            let event = CalendarEvent::for_schedule(&schedule, &maintenance, &vehicle);
            state
                .calendar
                .update_event(&calendar_id, &event_id, &event)
                .await?;
        }
    }

    state.db.upsert_schedule(&schedule).await?;
    tracing::info!(schedule_id = %schedule.id, start = %schedule.start, "Schedule moved");

    Ok(Json(schedule))
}

async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(schedule_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let scope = scope_of(&user)?;
    let schedule = load_schedule(&state, &scope, &schedule_id).await?;
    scope.require_manager(&schedule.workshop_id)?;

    remove_schedule(&state, &schedule).await?;

    Ok(Json(DeletedResponse {
        deleted: schedule.id,
    }))
}
