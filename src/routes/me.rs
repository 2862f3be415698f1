// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile of the authenticated user.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Driver, Workshop};
use crate::routes::auth::UserResponse;
use crate::routes::{clean, validated};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me).put(update_me))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    /// Owned or attended workshop
    pub workshop: Option<Workshop>,
    /// Driver record, for `user` accounts
    pub driver: Option<Driver>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 120, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 128, message = "must be 8 to 128 characters"))]
    pub password: Option<String>,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let not_found = || AppError::NotFound(format!("User {} not found", user.user_id));

    let (profile, driver) = tokio::try_join!(
        state.db.get_user(&user.user_id),
        state.db.get_driver(&user.user_id)
    )?;
    let profile = profile.ok_or_else(not_found)?;

    let workshop = match profile.workshop_id.as_deref() {
        Some(workshop_id) => state.db.get_workshop(workshop_id).await?,
        None => None,
    };

    Ok(Json(MeResponse {
        user: profile.into(),
        workshop,
        driver,
    }))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>> {
    let body = validated(body)?;

    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    if let Some(name) = clean(body.name) {
        profile.name = name;
    }
    if let Some(password) = body.password {
        profile.password_hash = tokio::task::spawn_blocking(move || {
            bcrypt::hash(password, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(anyhow::Error::from)?
        .map_err(anyhow::Error::from)?;
    }
    state.db.upsert_user(&profile).await?;

    // Keep the linked driver record in step with the profile.
    if let Some(mut driver) = state.db.get_driver(&user.user_id).await? {
        driver.name = profile.name.clone();
        if body.phone.is_some() {
            driver.phone = clean(body.phone);
        }
        state.db.upsert_driver(&driver).await?;
    }

    tracing::info!(user_id = %profile.id, "Profile updated");
    Ok(Json(profile.into()))
}
