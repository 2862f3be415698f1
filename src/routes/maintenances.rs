// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maintenance items, their due status and e-mailed reports.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::maintenance::LeadTime;
use crate::models::{Driver, Maintenance, MaintenanceStatus, Vehicle};
use crate::routes::schedules::remove_schedule;
use crate::routes::workshops::require_premium;
use crate::routes::{check_amount, clean, new_id, scope_of, validated, DeletedResponse};
use crate::services::mailer::{OutgoingMail, PdfAttachment};
use crate::services::scope::{load_maintenance, load_vehicle, visible_vehicles};
use crate::services::Scope;
use crate::time_utils::{normalize_input, now_rfc3339};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const MAX_CONCURRENT_DB_OPS: usize = 20;
/// Largest accepted report upload.
const MAX_REPORT_BYTES: usize = 5 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/maintenances",
            get(list_maintenances).post(create_maintenance),
        )
        .route(
            "/api/maintenances/{id}",
            get(get_maintenance)
                .put(update_maintenance)
                .delete(delete_maintenance),
        )
        .route("/api/maintenances/{id}/status", get(get_status))
        .route(
            "/api/maintenances/{id}/report",
            post(send_report).layer(DefaultBodyLimit::max(MAX_REPORT_BYTES)),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct MaintenanceRequest {
    #[validate(length(min = 1, message = "vehicle_id is required"))]
    pub vehicle_id: String,
    #[validate(length(min = 1, max = 200, message = "service is required"))]
    pub service: String,
    #[serde(default)]
    pub price: f64,
    pub km_limit: Option<f64>,
    /// RFC3339 or `YYYY-MM-DD`
    pub date_limit: Option<String>,
    #[serde(default)]
    pub done: bool,
    /// Master only; defaults to the vehicle owner's workshop
    pub workshop_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceQuery {
    pub vehicle_id: Option<String>,
}

/// Derived due status of a maintenance.
#[derive(Serialize)]
pub struct StatusResponse {
    pub maintenance_id: String,
    pub status: MaintenanceStatus,
    pub current_km: f64,
    pub km_limit: Option<f64>,
    pub date_limit: Option<String>,
    pub notification_km: f64,
    pub notification_days: i64,
}

#[derive(Serialize)]
pub struct MaintenanceDetail {
    #[serde(flatten)]
    pub maintenance: Maintenance,
    pub status: MaintenanceStatus,
    pub current_km: f64,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub maintenance_id: String,
    pub sent_to: String,
}

impl MaintenanceRequest {
    /// Checked numeric and date fields: `(km_limit, date_limit)`.
    fn limits(&self) -> Result<(Option<f64>, Option<String>)> {
        check_amount("price", self.price)?;
        if let Some(km) = self.km_limit {
            check_amount("km_limit", km)?;
        }
        let date_limit = self
            .date_limit
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| normalize_input("date_limit", d))
            .transpose()?;
        Ok((self.km_limit, date_limit))
    }
}

/// Current odometer and lead time used to classify a maintenance.
async fn status_inputs(
    state: &AppState,
    maintenance: &Maintenance,
    vehicle: &Vehicle,
) -> Result<(f64, LeadTime)> {
    let (latest, contract) = tokio::try_join!(
        state.db.latest_reading(&vehicle.id),
        state
            .db
            .contract_for_workshop(Some(maintenance.workshop_id.as_str()))
    )?;
    Ok((vehicle.current_km(latest.as_ref()), contract.lead_time()))
}

async fn list_maintenances(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MaintenanceQuery>,
) -> Result<Json<Vec<Maintenance>>> {
    let scope = scope_of(&user)?;

    if let Some(vehicle_id) = query.vehicle_id.as_deref() {
        let (vehicle, _) = load_vehicle(&state.db, &scope, vehicle_id).await?;
        let maintenances = state
            .db
            .list_maintenances_for_vehicle(&vehicle.id)
            .await?
            .into_iter()
            .filter(|m| scope.sees_maintenance(m, &vehicle))
            .collect();
        return Ok(Json(maintenances));
    }

    let maintenances = match &scope {
        Scope::All => state.db.list_maintenances().await?,
        Scope::Workshop(w) => state.db.list_maintenances_for_workshop(w).await?,
        Scope::Driver(_) => {
            let vehicles = visible_vehicles(&state.db, &scope).await?;
            let db = &state.db;
            let per_vehicle: Vec<Vec<Maintenance>> = stream::iter(vehicles)
                .map(|(vehicle, _)| async move {
                    db.list_maintenances_for_vehicle(&vehicle.id).await
                })
                .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                .try_collect()
                .await?;
            per_vehicle.into_iter().flatten().collect()
        }
    };

    Ok(Json(maintenances))
}

async fn create_maintenance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<MaintenanceRequest>,
) -> Result<(StatusCode, Json<Maintenance>)> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;
    let (km_limit, date_limit) = body.limits()?;

    let (vehicle, owner) = load_vehicle(&state.db, &scope, &body.vehicle_id).await?;

    let workshop_id = match &scope {
        Scope::Workshop(w) => w.clone(),
        Scope::All => clean(body.workshop_id)
            .or_else(|| owner.as_ref().and_then(Driver::workshop).map(str::to_string))
            .ok_or_else(|| {
                AppError::BadRequest(
                    "workshop_id is required for vehicles without a workshop".to_string(),
                )
            })?,
        Scope::Driver(_) => {
            return Err(AppError::Forbidden(
                "only workshops can register maintenances".to_string(),
            ))
        }
    };
    if state.db.get_workshop(&workshop_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Workshop {} not found", workshop_id)));
    }

    let maintenance = Maintenance {
        id: new_id(),
        vehicle_id: vehicle.id,
        workshop_id,
        service: body.service.trim().to_string(),
        price: body.price,
        km_limit,
        date_limit,
        done: body.done,
        created_at: now_rfc3339(),
    };
    state.db.upsert_maintenance(&maintenance).await?;

    tracing::info!(
        maintenance_id = %maintenance.id,
        vehicle_id = %maintenance.vehicle_id,
        workshop_id = %maintenance.workshop_id,
        "Maintenance created"
    );
    Ok((StatusCode::CREATED, Json(maintenance)))
}

async fn get_maintenance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(maintenance_id): Path<String>,
) -> Result<Json<MaintenanceDetail>> {
    let scope = scope_of(&user)?;
    let (maintenance, vehicle) = load_maintenance(&state.db, &scope, &maintenance_id).await?;
    let (current_km, lead) = status_inputs(&state, &maintenance, &vehicle).await?;

    Ok(Json(MaintenanceDetail {
        status: maintenance.status(current_km, lead, Utc::now()),
        current_km,
        maintenance,
    }))
}

async fn update_maintenance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(maintenance_id): Path<String>,
    Json(body): Json<MaintenanceRequest>,
) -> Result<Json<Maintenance>> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;
    let (km_limit, date_limit) = body.limits()?;

    let (mut maintenance, _) = load_maintenance(&state.db, &scope, &maintenance_id).await?;
    scope.require_manager(&maintenance.workshop_id)?;

    if body.vehicle_id != maintenance.vehicle_id {
        return Err(AppError::BadRequest(
            "a maintenance cannot be moved to another vehicle".to_string(),
        ));
    }

    maintenance.service = body.service.trim().to_string();
    maintenance.price = body.price;
    maintenance.km_limit = km_limit;
    maintenance.date_limit = date_limit;
    maintenance.done = body.done;
    state.db.upsert_maintenance(&maintenance).await?;

    Ok(Json(maintenance))
}

async fn delete_maintenance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(maintenance_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let scope = scope_of(&user)?;
    let (maintenance, _) = load_maintenance(&state.db, &scope, &maintenance_id).await?;
    scope.require_manager(&maintenance.workshop_id)?;

    let schedules = state
        .db
        .list_schedules_for_vehicle(&maintenance.vehicle_id)
        .await?;
    for schedule in schedules
        .into_iter()
        .filter(|s| s.maintenance_id == maintenance.id)
    {
        remove_schedule(&state, &schedule).await?;
    }

    state.db.delete_maintenance(&maintenance.id).await?;
    tracing::info!(maintenance_id = %maintenance.id, "Maintenance deleted");

    Ok(Json(DeletedResponse {
        deleted: maintenance.id,
    }))
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(maintenance_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let scope = scope_of(&user)?;
    let (maintenance, vehicle) = load_maintenance(&state.db, &scope, &maintenance_id).await?;
    let (current_km, lead) = status_inputs(&state, &maintenance, &vehicle).await?;

    Ok(Json(StatusResponse {
        status: maintenance.status(current_km, lead, Utc::now()),
        maintenance_id: maintenance.id,
        current_km,
        km_limit: maintenance.km_limit,
        date_limit: maintenance.date_limit,
        notification_km: lead.km,
        notification_days: lead.days,
    }))
}

/// E-mail a PDF report (request body) to the vehicle owner.
async fn send_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(maintenance_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ReportResponse>)> {
    let scope = scope_of(&user)?;

    if !body.starts_with(b"%PDF-") {
        return Err(AppError::BadRequest("body must be a PDF document".to_string()));
    }

    let (maintenance, vehicle) = load_maintenance(&state.db, &scope, &maintenance_id).await?;
    scope.require_manager(&maintenance.workshop_id)?;

    let workshop = state
        .db
        .get_workshop(&maintenance.workshop_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Workshop {} not found", maintenance.workshop_id))
        })?;
    let contract = state.db.resolve_contract(&workshop).await?;
    require_premium(&workshop, &contract)?;

    let owner = state
        .db
        .get_driver(&vehicle.owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", vehicle.owner_id)))?;

    let mail = OutgoingMail {
        to: owner.email.clone(),
        subject: format!("{}: {} ({})", workshop.name, maintenance.service, vehicle.plate),
        text: format!(
            "Olá {},\n\nSegue em anexo o relatório da manutenção \"{}\" do veículo {} {} ({}).\n\n{}",
            owner.name, maintenance.service, vehicle.brand, vehicle.model, vehicle.plate, workshop.name
        ),
        attachment: Some(PdfAttachment {
            filename: format!("manutencao-{}.pdf", maintenance.id),
            content: body.to_vec(),
        }),
    };
    state.mailer.send(&mail).await?;

    tracing::info!(
        maintenance_id = %maintenance.id,
        driver_id = %owner.id,
        bytes = body.len(),
        "Maintenance report sent"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ReportResponse {
            maintenance_id: maintenance.id,
            sent_to: owner.email,
        }),
    ))
}
