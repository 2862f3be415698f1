// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drivers and their association with workshops.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Driver;
use crate::routes::{clean, new_id, scope_of, validated, DeletedResponse};
use crate::services::scope::{load_driver, visible_drivers};
use crate::services::Scope;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/drivers", get(list_drivers).post(create_driver))
        .route(
            "/api/drivers/{id}",
            get(get_driver).put(update_driver).delete(delete_driver),
        )
        .route("/api/drivers/{id}/associate", post(associate_driver))
        .route("/api/drivers/{id}/unassociate", post(unassociate_driver))
}

#[derive(Debug, Deserialize, Validate)]
pub struct DriverRequest {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    /// Master only; organizations always create drivers in their workshop
    pub workshop_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssociateRequest {
    /// Master only; organizations associate with their own workshop
    pub workshop_id: Option<String>,
}

/// Workshop a write lands in: the organization's own, or the one a master named.
fn target_workshop(scope: &Scope, requested: Option<String>) -> Result<String> {
    match scope {
        Scope::Workshop(w) => Ok(w.clone()),
        Scope::All => clean(requested)
            .ok_or_else(|| AppError::BadRequest("workshop_id is required".to_string())),
        Scope::Driver(_) => Err(AppError::Forbidden(
            "only workshops can manage drivers".to_string(),
        )),
    }
}

/// Fail with `LimitExceeded` if the workshop cannot take another driver.
async fn check_driver_capacity(db: &FirestoreDb, workshop_id: &str) -> Result<()> {
    let workshop = db
        .get_workshop(workshop_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workshop {} not found", workshop_id)))?;
    let (contract, drivers) = tokio::try_join!(
        db.resolve_contract(&workshop),
        db.list_drivers_for_workshop(workshop_id)
    )?;
    contract.check_driver_capacity(drivers.len())
}

/// Whether the caller may change this driver record.
fn may_edit(scope: &Scope, driver: &Driver) -> bool {
    match scope {
        Scope::Driver(d) => d == &driver.id,
        _ => driver
            .workshop()
            .is_some_and(|w| scope.manages_workshop(w))
            || scope.is_master(),
    }
}

/// Mirror a driver's workshop onto its login account.
async fn sync_user_workshop(db: &FirestoreDb, driver: &Driver) -> Result<()> {
    let Some(user_id) = driver.user_id.as_deref() else {
        return Ok(());
    };
    if let Some(mut user) = db.get_user(user_id).await? {
        user.workshop_id = driver.workshop().map(str::to_string);
        db.upsert_user(&user).await?;
    }
    Ok(())
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Driver>>> {
    let scope = scope_of(&user)?;
    Ok(Json(visible_drivers(&state.db, &scope).await?))
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<DriverRequest>,
) -> Result<(StatusCode, Json<Driver>)> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;
    let workshop_id = target_workshop(&scope, body.workshop_id)?;

    check_driver_capacity(&state.db, &workshop_id).await?;

    let driver = Driver {
        id: new_id(),
        user_id: None,
        name: body.name.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        phone: clean(body.phone),
        workshop_id,
        created_at: now_rfc3339(),
    };
    state.db.upsert_driver(&driver).await?;

    tracing::info!(driver_id = %driver.id, workshop_id = %driver.workshop_id, "Driver created");
    Ok((StatusCode::CREATED, Json(driver)))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(driver_id): Path<String>,
) -> Result<Json<Driver>> {
    let scope = scope_of(&user)?;
    Ok(Json(load_driver(&state.db, &scope, &driver_id).await?))
}

async fn update_driver(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(driver_id): Path<String>,
    Json(body): Json<DriverRequest>,
) -> Result<Json<Driver>> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;

    let mut driver = load_driver(&state.db, &scope, &driver_id).await?;
    if !may_edit(&scope, &driver) {
        return Err(AppError::Forbidden(
            "not allowed to change this driver".to_string(),
        ));
    }

    // Association changes go through associate/unassociate.
    driver.name = body.name.trim().to_string();
    driver.email = body.email.trim().to_lowercase();
    driver.phone = clean(body.phone);
    state.db.upsert_driver(&driver).await?;

    Ok(Json(driver))
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(driver_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let scope = scope_of(&user)?;
    let driver = load_driver(&state.db, &scope, &driver_id).await?;

    if matches!(scope, Scope::Driver(_)) || !may_edit(&scope, &driver) {
        return Err(AppError::Forbidden(
            "not allowed to delete this driver".to_string(),
        ));
    }
    if driver.user_id.is_some() {
        return Err(AppError::Conflict(
            "driver has a login account; unassociate instead".to_string(),
        ));
    }

    let vehicles = state.db.list_vehicles_for_owner(&driver.id).await?;
    if !vehicles.is_empty() {
        return Err(AppError::Conflict(format!(
            "driver still owns {} vehicle(s)",
            vehicles.len()
        )));
    }

    state.db.delete_driver(&driver.id).await?;
    tracing::info!(driver_id = %driver.id, "Driver deleted");

    Ok(Json(DeletedResponse { deleted: driver.id }))
}

/// Associate a driver with a workshop.
///
/// A driver belongs to at most one workshop; one already associated
/// elsewhere is a conflict.
async fn associate_driver(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(driver_id): Path<String>,
    body: Option<Json<AssociateRequest>>,
) -> Result<Json<Driver>> {
    let scope = scope_of(&user)?;
    let requested = body.map(|Json(b)| b).unwrap_or_default().workshop_id;
    let workshop_id = target_workshop(&scope, requested)?;

    // Unassociated drivers are outside every organization's scope, so
    // look the record up directly.
    let mut driver = state
        .db
        .get_driver(&driver_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", driver_id)))?;

    match driver.workshop() {
        Some(current) if current == workshop_id => return Ok(Json(driver)),
        Some(_) => {
            return Err(AppError::Conflict(
                "driver is already associated with another workshop".to_string(),
            ))
        }
        None => {}
    }

    check_driver_capacity(&state.db, &workshop_id).await?;

    driver.workshop_id = workshop_id;
    state.db.upsert_driver(&driver).await?;
    sync_user_workshop(&state.db, &driver).await?;

    tracing::info!(driver_id = %driver.id, workshop_id = %driver.workshop_id, "Driver associated");
    Ok(Json(driver))
}

async fn unassociate_driver(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(driver_id): Path<String>,
) -> Result<Json<Driver>> {
    let scope = scope_of(&user)?;
    let mut driver = load_driver(&state.db, &scope, &driver_id).await?;

    if !may_edit(&scope, &driver) {
        return Err(AppError::Forbidden(
            "not allowed to change this driver".to_string(),
        ));
    }
    let Some(previous) = driver.workshop().map(str::to_string) else {
        return Ok(Json(driver));
    };

    driver.workshop_id = String::new();
    state.db.upsert_driver(&driver).await?;
    sync_user_workshop(&state.db, &driver).await?;

    tracing::info!(driver_id = %driver.id, workshop_id = %previous, "Driver unassociated");
    Ok(Json(driver))
}
