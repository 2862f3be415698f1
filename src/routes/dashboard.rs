// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::routes::scope_of;
use crate::services::dashboard::{build_dashboard, Dashboard};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard", get(get_dashboard))
}

/// Fleet overview for the caller's scope.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Dashboard>> {
    let scope = scope_of(&user)?;
    Ok(Json(build_dashboard(&state.db, &scope).await?))
}
