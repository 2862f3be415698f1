// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vehicle make/model/year pickers.

use crate::error::Result;
use crate::services::vehicle_lookup::LookupItem;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/lookup/brands", get(brands))
        .route("/api/lookup/brands/{brand}/models", get(models))
        .route(
            "/api/lookup/brands/{brand}/models/{model}/years",
            get(years),
        )
}

async fn brands(State(state): State<Arc<AppState>>) -> Result<Json<Vec<LookupItem>>> {
    Ok(Json(state.vehicle_lookup.brands().await?))
}

async fn models(
    State(state): State<Arc<AppState>>,
    Path(brand): Path<String>,
) -> Result<Json<Vec<LookupItem>>> {
    Ok(Json(state.vehicle_lookup.models(&brand).await?))
}

async fn years(
    State(state): State<Arc<AppState>>,
    Path((brand, model)): Path<(String, String)>,
) -> Result<Json<Vec<LookupItem>>> {
    Ok(Json(state.vehicle_lookup.years(&brand, &model).await?))
}
