// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Service contracts (plan limits). Reads are open to every account;
//! writes are master only.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{contract::BASIC_CONTRACT_ID, Contract};
use crate::routes::{new_id, scope_of, validated, DeletedResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/contracts", get(list_contracts).post(create_contract))
        .route(
            "/api/contracts/{id}",
            get(get_contract).put(update_contract).delete(delete_contract),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContractRequest {
    #[validate(length(min = 1, max = 80, message = "name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "must allow at least one driver"))]
    pub max_drivers: u32,
    #[validate(range(min = 1, message = "must allow at least one vehicle"))]
    pub max_vehicles_per_driver: u32,
    pub max_alarms_per_vehicle: u32,
    pub notification_km: u32,
    pub notification_days: u32,
    #[validate(range(min = 1, message = "must allow at least one schedule per day"))]
    pub max_schedules_per_day: u32,
    #[serde(default)]
    pub free_trial_days: u32,
}

impl ContractRequest {
    fn into_contract(self, id: String) -> Contract {
        Contract {
            id,
            name: self.name.trim().to_string(),
            max_drivers: self.max_drivers,
            max_vehicles_per_driver: self.max_vehicles_per_driver,
            max_alarms_per_vehicle: self.max_alarms_per_vehicle,
            notification_km: self.notification_km,
            notification_days: self.notification_days,
            max_schedules_per_day: self.max_schedules_per_day,
            free_trial_days: self.free_trial_days,
        }
    }
}

fn reject_basic(contract_id: &str) -> Result<()> {
    if contract_id == BASIC_CONTRACT_ID {
        return Err(AppError::BadRequest(
            "the basic contract is built in and cannot be changed".to_string(),
        ));
    }
    Ok(())
}

/// List contracts, the built-in basic contract first.
async fn list_contracts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Contract>>> {
    let mut contracts = vec![Contract::basic()];
    contracts.extend(state.db.list_contracts().await?);
    Ok(Json(contracts))
}

async fn get_contract(
    State(state): State<Arc<AppState>>,
    Path(contract_id): Path<String>,
) -> Result<Json<Contract>> {
    if contract_id == BASIC_CONTRACT_ID {
        return Ok(Json(Contract::basic()));
    }
    let contract = state
        .db
        .get_contract(&contract_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", contract_id)))?;
    Ok(Json(contract))
}

async fn create_contract(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ContractRequest>,
) -> Result<(StatusCode, Json<Contract>)> {
    scope_of(&user)?.require_master()?;
    let contract = validated(body)?.into_contract(new_id());

    state.db.upsert_contract(&contract).await?;
    tracing::info!(contract_id = %contract.id, name = %contract.name, "Contract created");

    Ok((StatusCode::CREATED, Json(contract)))
}

async fn update_contract(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(contract_id): Path<String>,
    Json(body): Json<ContractRequest>,
) -> Result<Json<Contract>> {
    scope_of(&user)?.require_master()?;
    reject_basic(&contract_id)?;
    let body = validated(body)?;

    if state.db.get_contract(&contract_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Contract {} not found", contract_id)));
    }

    let contract = body.into_contract(contract_id);
    state.db.upsert_contract(&contract).await?;
    Ok(Json(contract))
}

async fn delete_contract(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(contract_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    scope_of(&user)?.require_master()?;
    reject_basic(&contract_id)?;

    if state.db.get_contract(&contract_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Contract {} not found", contract_id)));
    }

    let in_use = state
        .db
        .list_workshops()
        .await?
        .into_iter()
        .filter(|w| w.contract == contract_id)
        .count();
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "contract is assigned to {} workshop(s)",
            in_use
        )));
    }

    state.db.delete_contract(&contract_id).await?;
    tracing::info!(contract_id = %contract_id, "Contract deleted");

    Ok(Json(DeletedResponse {
        deleted: contract_id,
    }))
}
