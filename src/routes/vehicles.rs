// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vehicles, their alarm thresholds and telemetry readings.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::vehicle::normalize_plate;
use crate::models::{Alarm, AlarmThresholds, Driver, Reading, Vehicle};
use crate::routes::{check_amount, clean, new_id, scope_of, validated, DeletedResponse};
use crate::services::scope::{load_driver, load_vehicle, visible_vehicles};
use crate::services::Scope;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const DEFAULT_READINGS_LIMIT: u32 = 50;
const MAX_READINGS_LIMIT: u32 = 500;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/vehicles", get(list_vehicles).post(create_vehicle))
        .route(
            "/api/vehicles/{id}",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/api/vehicles/{id}/readings/latest", get(latest_reading))
        .route("/api/vehicles/{id}/readings", get(list_readings))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VehicleRequest {
    /// Owning driver; `user` accounts always own what they create
    pub owner_id: Option<String>,
    #[validate(length(min = 1, max = 10, message = "plate is required"))]
    pub plate: String,
    #[validate(length(max = 17))]
    pub vin: Option<String>,
    #[validate(length(min = 1, max = 60, message = "brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, max = 120, message = "model is required"))]
    pub model: String,
    #[validate(range(min = 1900, max = 2100, message = "must be between 1900 and 2100"))]
    pub year: u16,
    #[serde(default)]
    pub initial_km: f64,
    #[serde(default)]
    pub thresholds: AlarmThresholds,
}

/// Vehicle with its latest telemetry.
#[derive(Serialize)]
pub struct VehicleDetail {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub current_km: f64,
    pub latest_reading: Option<Reading>,
    pub alarms: Vec<Alarm>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    pub limit: Option<u32>,
}

/// Normalize the plate and make sure no other vehicle carries it.
async fn unique_plate(db: &FirestoreDb, raw: &str, vehicle_id: Option<&str>) -> Result<String> {
    let plate = normalize_plate(raw);
    if plate.is_empty() {
        return Err(AppError::BadRequest(
            "plate must contain letters or digits".to_string(),
        ));
    }
    if let Some(existing) = db.find_vehicle_by_plate(&plate).await? {
        if Some(existing.id.as_str()) != vehicle_id {
            return Err(AppError::Conflict(format!(
                "a vehicle with plate {} already exists",
                plate
            )));
        }
    }
    Ok(plate)
}

/// Driver that will own a new vehicle.
async fn resolve_owner(
    db: &FirestoreDb,
    scope: &Scope,
    requested: Option<String>,
) -> Result<Driver> {
    let owner_id = match (scope, clean(requested)) {
        (Scope::Driver(d), _) => d.clone(),
        (_, Some(owner_id)) => owner_id,
        (_, None) => {
            return Err(AppError::BadRequest("owner_id is required".to_string()));
        }
    };
    load_driver(db, scope, &owner_id).await
}

async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Vehicle>>> {
    let scope = scope_of(&user)?;
    let vehicles = visible_vehicles(&state.db, &scope)
        .await?
        .into_iter()
        .map(|(vehicle, _)| vehicle)
        .collect();
    Ok(Json(vehicles))
}

async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<VehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>)> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;
    check_amount("initial_km", body.initial_km)?;

    let owner = resolve_owner(&state.db, &scope, body.owner_id).await?;
    let plate = unique_plate(&state.db, &body.plate, None).await?;

    let (contract, owned) = tokio::try_join!(
        state.db.contract_for_workshop(owner.workshop()),
        state.db.list_vehicles_for_owner(&owner.id)
    )?;
    contract.check_vehicle_capacity(owned.len())?;
    contract.check_alarm_count(body.thresholds.configured_count())?;

    let vehicle = Vehicle {
        id: new_id(),
        owner_id: owner.id,
        plate,
        vin: clean(body.vin).map(|v| v.to_uppercase()),
        brand: body.brand.trim().to_string(),
        model: body.model.trim().to_string(),
        year: body.year,
        initial_km: body.initial_km,
        thresholds: body.thresholds,
        created_at: now_rfc3339(),
    };
    state.db.upsert_vehicle(&vehicle).await?;

    tracing::info!(vehicle_id = %vehicle.id, owner_id = %vehicle.owner_id, plate = %vehicle.plate, "Vehicle created");
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<VehicleDetail>> {
    let scope = scope_of(&user)?;
    let (vehicle, _) = load_vehicle(&state.db, &scope, &vehicle_id).await?;
    let latest_reading = state.db.latest_reading(&vehicle.id).await?;

    let alarms = latest_reading
        .as_ref()
        .map(|r| vehicle.thresholds.evaluate(r))
        .unwrap_or_default();

    Ok(Json(VehicleDetail {
        current_km: vehicle.current_km(latest_reading.as_ref()),
        vehicle,
        latest_reading,
        alarms,
    }))
}

async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vehicle_id): Path<String>,
    Json(body): Json<VehicleRequest>,
) -> Result<Json<Vehicle>> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;
    check_amount("initial_km", body.initial_km)?;

    let (mut vehicle, owner) = load_vehicle(&state.db, &scope, &vehicle_id).await?;
    let plate = unique_plate(&state.db, &body.plate, Some(&vehicle.id)).await?;

    let contract = state
        .db
        .contract_for_workshop(owner.as_ref().and_then(Driver::workshop))
        .await?;
    contract.check_alarm_count(body.thresholds.configured_count())?;

    // Ownership is fixed at creation.
    vehicle.plate = plate;
    vehicle.vin = clean(body.vin).map(|v| v.to_uppercase());
    vehicle.brand = body.brand.trim().to_string();
    vehicle.model = body.model.trim().to_string();
    vehicle.year = body.year;
    vehicle.initial_km = body.initial_km;
    vehicle.thresholds = body.thresholds;
    state.db.upsert_vehicle(&vehicle).await?;

    Ok(Json(vehicle))
}

async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let scope = scope_of(&user)?;
    let (vehicle, _) = load_vehicle(&state.db, &scope, &vehicle_id).await?;

    state.db.delete_vehicle(&vehicle.id).await?;

    Ok(Json(DeletedResponse {
        deleted: vehicle.id,
    }))
}

async fn latest_reading(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<Reading>> {
    let scope = scope_of(&user)?;
    let (vehicle, _) = load_vehicle(&state.db, &scope, &vehicle_id).await?;

    let reading = state
        .db
        .latest_reading(&vehicle.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No readings for vehicle {}", vehicle.id)))?;
    Ok(Json(reading))
}

async fn list_readings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(vehicle_id): Path<String>,
    Query(query): Query<ReadingsQuery>,
) -> Result<Json<Vec<Reading>>> {
    let scope = scope_of(&user)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_READINGS_LIMIT)
        .clamp(1, MAX_READINGS_LIMIT);

    let (vehicle, _) = load_vehicle(&state.db, &scope, &vehicle_id).await?;
    Ok(Json(state.db.list_readings(&vehicle.id, limit).await?))
}
