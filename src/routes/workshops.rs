// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workshop management, contract assignment and calendar setup.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{contract::BASIC_CONTRACT_ID, Contract, Workshop};
use crate::routes::{clean, new_id, schedules, scope_of, validated, DeletedResponse};
use crate::services::Scope;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/workshops", get(list_workshops).post(create_workshop))
        .route(
            "/api/workshops/{id}",
            get(get_workshop).put(update_workshop).delete(delete_workshop),
        )
        .route(
            "/api/workshops/{id}/contract",
            get(get_workshop_contract).put(set_workshop_contract),
        )
        .route("/api/workshops/{id}/calendar", post(create_calendar))
}

#[derive(Debug, Deserialize, Validate)]
pub struct WorkshopRequest {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 20))]
    pub cnpj: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub address: Option<String>,
    /// Master only; defaults to the basic contract
    pub contract: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetContractRequest {
    #[validate(length(min = 1, message = "contract is required"))]
    pub contract: String,
}

#[derive(Serialize)]
pub struct WorkshopContractResponse {
    pub workshop_id: String,
    pub contract: Contract,
    pub premium: bool,
}

/// Load a workshop visible to `scope`.
///
/// Drivers see the workshop they are associated with.
async fn load_workshop(db: &FirestoreDb, scope: &Scope, workshop_id: &str) -> Result<Workshop> {
    let not_found = || AppError::NotFound(format!("Workshop {} not found", workshop_id));

    let visible = match scope {
        Scope::All => true,
        Scope::Workshop(w) => w == workshop_id,
        Scope::Driver(d) => db
            .get_driver(d)
            .await?
            .is_some_and(|driver| driver.workshop() == Some(workshop_id)),
    };
    if !visible {
        return Err(not_found());
    }

    db.get_workshop(workshop_id).await?.ok_or_else(not_found)
}

/// Check that a contract reference resolves.
async fn ensure_contract_exists(db: &FirestoreDb, contract: &str) -> Result<()> {
    if contract != BASIC_CONTRACT_ID && db.get_contract(contract).await?.is_none() {
        return Err(AppError::NotFound(format!("Contract {} not found", contract)));
    }
    Ok(())
}

/// Reject features reserved for premium workshops.
pub(crate) fn require_premium(workshop: &Workshop, contract: &Contract) -> Result<()> {
    if workshop.is_premium(contract, Utc::now()) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "this feature requires a premium contract".to_string(),
        ))
    }
}

async fn list_workshops(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Workshop>>> {
    let scope = scope_of(&user)?;

    let workshops = match &scope {
        Scope::All => state.db.list_workshops().await?,
        Scope::Workshop(w) => state.db.get_workshop(w).await?.into_iter().collect(),
        Scope::Driver(d) => match state.db.get_driver(d).await?.and_then(|d| {
            d.workshop().map(str::to_string)
        }) {
            Some(w) => state.db.get_workshop(&w).await?.into_iter().collect(),
            None => Vec::new(),
        },
    };

    Ok(Json(workshops))
}

async fn create_workshop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<WorkshopRequest>,
) -> Result<(StatusCode, Json<Workshop>)> {
    scope_of(&user)?.require_master()?;
    let body = validated(body)?;

    let contract = clean(body.contract).unwrap_or_else(|| BASIC_CONTRACT_ID.to_string());
    ensure_contract_exists(&state.db, &contract).await?;

    let workshop = Workshop {
        id: new_id(),
        name: body.name.trim().to_string(),
        cnpj: clean(body.cnpj),
        phone: clean(body.phone),
        address: clean(body.address),
        contract,
        owner_id: None,
        calendar_id: None,
        created_at: now_rfc3339(),
    };
    state.db.upsert_workshop(&workshop).await?;

    tracing::info!(workshop_id = %workshop.id, contract = %workshop.contract, "Workshop created");
    Ok((StatusCode::CREATED, Json(workshop)))
}

async fn get_workshop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workshop_id): Path<String>,
) -> Result<Json<Workshop>> {
    let scope = scope_of(&user)?;
    Ok(Json(load_workshop(&state.db, &scope, &workshop_id).await?))
}

async fn update_workshop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workshop_id): Path<String>,
    Json(body): Json<WorkshopRequest>,
) -> Result<Json<Workshop>> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;

    let mut workshop = load_workshop(&state.db, &scope, &workshop_id).await?;
    scope.require_manager(&workshop.id)?;

    // Contracts change only through the dedicated endpoint.
    workshop.name = body.name.trim().to_string();
    workshop.cnpj = clean(body.cnpj);
    workshop.phone = clean(body.phone);
    workshop.address = clean(body.address);
    state.db.upsert_workshop(&workshop).await?;

    Ok(Json(workshop))
}

async fn delete_workshop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workshop_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let scope = scope_of(&user)?;
    scope.require_master()?;
    let workshop = load_workshop(&state.db, &scope, &workshop_id).await?;

    let events = schedules::release_calendar_events(&state, &workshop.id).await?;
    let removed = state.db.delete_workshop(&workshop.id).await?;
    tracing::info!(workshop_id = %workshop.id, removed, events, "Workshop deleted");

    Ok(Json(DeletedResponse {
        deleted: workshop.id,
    }))
}

async fn get_workshop_contract(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workshop_id): Path<String>,
) -> Result<Json<WorkshopContractResponse>> {
    let scope = scope_of(&user)?;
    let workshop = load_workshop(&state.db, &scope, &workshop_id).await?;
    let contract = state.db.resolve_contract(&workshop).await?;

    Ok(Json(WorkshopContractResponse {
        premium: workshop.is_premium(&contract, Utc::now()),
        workshop_id: workshop.id,
        contract,
    }))
}

async fn set_workshop_contract(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workshop_id): Path<String>,
    Json(body): Json<SetContractRequest>,
) -> Result<Json<WorkshopContractResponse>> {
    let scope = scope_of(&user)?;
    scope.require_master()?;
    let body = validated(body)?;

    let mut workshop = load_workshop(&state.db, &scope, &workshop_id).await?;
    let contract_id = body.contract.trim().to_string();
    ensure_contract_exists(&state.db, &contract_id).await?;

    workshop.contract = contract_id;
    state.db.upsert_workshop(&workshop).await?;
    let contract = state.db.resolve_contract(&workshop).await?;

    tracing::info!(
        workshop_id = %workshop.id,
        contract = %workshop.contract,
        "Workshop contract changed"
    );

    Ok(Json(WorkshopContractResponse {
        premium: workshop.is_premium(&contract, Utc::now()),
        workshop_id: workshop.id,
        contract,
    }))
}

/// Create the external calendar that mirrors this workshop's schedules.
async fn create_calendar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workshop_id): Path<String>,
) -> Result<(StatusCode, Json<Workshop>)> {
    let scope = scope_of(&user)?;
    let mut workshop = load_workshop(&state.db, &scope, &workshop_id).await?;
    scope.require_manager(&workshop.id)?;

    let contract = state.db.resolve_contract(&workshop).await?;
    require_premium(&workshop, &contract)?;

    if workshop.calendar_id.is_some() {
        return Err(AppError::Conflict(
            "workshop already has a calendar".to_string(),
        ));
    }

    let calendar_id = state.calendar.create_calendar(&workshop.name).await?;
    workshop.calendar_id = Some(calendar_id);
    state.db.upsert_workshop(&workshop).await?;

    tracing::info!(workshop_id = %workshop.id, "Workshop calendar created");
    Ok((StatusCode::CREATED, Json(workshop)))
}
