// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Service catalog offered by each workshop.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::ServiceOffering;
use crate::routes::{check_amount, clean, new_id, scope_of, validated, DeletedResponse};
use crate::services::Scope;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/services", get(list_services).post(create_service))
        .route(
            "/api/services/{id}",
            put(update_service).delete(delete_service),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServiceRequest {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub price: f64,
    /// Master only
    pub workshop_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceQuery {
    pub workshop_id: Option<String>,
}

/// Any account may browse a workshop's catalog; without a filter the
/// caller's own workshop is used.
async fn list_services(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<Vec<ServiceOffering>>> {
    let scope = scope_of(&user)?;

    let workshop_id = match (clean(query.workshop_id), &scope) {
        (Some(w), _) => Some(w),
        (None, Scope::Workshop(w)) => Some(w.clone()),
        (None, _) => user.workshop_id.clone(),
    };

    let services = match (workshop_id, &scope) {
        (Some(w), _) => state.db.list_services_for_workshop(&w).await?,
        (None, Scope::All) => state.db.list_services().await?,
        (None, _) => Vec::new(),
    };
    Ok(Json(services))
}

async fn create_service(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ServiceRequest>,
) -> Result<(StatusCode, Json<ServiceOffering>)> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;
    check_amount("price", body.price)?;

    let workshop_id = match &scope {
        Scope::Workshop(w) => w.clone(),
        Scope::All => clean(body.workshop_id)
            .ok_or_else(|| AppError::BadRequest("workshop_id is required".to_string()))?,
        Scope::Driver(_) => {
            return Err(AppError::Forbidden(
                "only workshops can offer services".to_string(),
            ))
        }
    };
    if state.db.get_workshop(&workshop_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Workshop {} not found", workshop_id)));
    }

    let service = ServiceOffering {
        id: new_id(),
        workshop_id,
        name: body.name.trim().to_string(),
        description: clean(body.description),
        price: body.price,
    };
    state.db.upsert_service(&service).await?;

    tracing::info!(service_id = %service.id, workshop_id = %service.workshop_id, "Service created");
    Ok((StatusCode::CREATED, Json(service)))
}

/// Load a service the caller may change.
async fn load_managed_service(
    state: &AppState,
    scope: &Scope,
    service_id: &str,
) -> Result<ServiceOffering> {
    state
        .db
        .get_service(service_id)
        .await?
        .filter(|s| scope.manages_workshop(&s.workshop_id))
        .ok_or_else(|| AppError::NotFound(format!("Service {} not found", service_id)))
}

async fn update_service(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(service_id): Path<String>,
    Json(body): Json<ServiceRequest>,
) -> Result<Json<ServiceOffering>> {
    let scope = scope_of(&user)?;
    let body = validated(body)?;
    check_amount("price", body.price)?;

    let mut service = load_managed_service(&state, &scope, &service_id).await?;
    service.name = body.name.trim().to_string();
    service.description = clean(body.description);
    service.price = body.price;
    state.db.upsert_service(&service).await?;

    Ok(Json(service))
}

async fn delete_service(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(service_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let scope = scope_of(&user)?;
    let service = load_managed_service(&state, &scope, &service_id).await?;

    state.db.delete_service(&service.id).await?;

    Ok(Json(DeletedResponse {
        deleted: service.id,
    }))
}
