// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and password login.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::{contract::BASIC_CONTRACT_ID, Driver, Role, User, Workshop};
use crate::routes::{clean, new_id, validated};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Auth routes (public).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
}

/// Public view of a user (no password hash).
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub workshop_id: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            workshop_id: user.workshop_id,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "must be 8 to 128 characters"))]
    pub password: String,
    pub role: Role,
    /// Organization only: name of the workshop to create
    #[validate(length(min = 1, max = 120, message = "workshop name cannot be empty"))]
    pub workshop_name: Option<String>,
    #[validate(length(max = 20))]
    pub cnpj: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub address: Option<String>,
    /// User only: workshop to join right away
    pub workshop_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Attach the session cookie and build the response body.
fn session_response(
    state: &AppState,
    jar: CookieJar,
    user: User,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let token = create_jwt(&user, &state.config.jwt_signing_key)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

async fn hash_password(password: String) -> Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(anyhow::Error::from)?;
    Ok(hash)
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(anyhow::Error::from)?
        // A corrupt stored hash is treated as a failed login.
        .unwrap_or(false);
    Ok(ok)
}

/// Register a new organization or user account.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let body = validated(body)?;
    let email = body.email.trim().to_lowercase();

    if body.role == Role::Master {
        return Err(AppError::BadRequest(
            "master accounts cannot be self-registered".to_string(),
        ));
    }

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "an account for {} already exists",
            email
        )));
    }

    let now = now_rfc3339();
    let user_id = new_id();

    let (workshop, driver) = match body.role {
        Role::Organization => {
            let name = clean(body.workshop_name).ok_or_else(|| {
                AppError::BadRequest("workshop_name is required for organizations".to_string())
            })?;
            let workshop = Workshop {
                id: new_id(),
                name,
                cnpj: clean(body.cnpj),
                phone: clean(body.phone),
                address: clean(body.address),
                contract: BASIC_CONTRACT_ID.to_string(),
                owner_id: Some(user_id.clone()),
                calendar_id: None,
                created_at: now.clone(),
            };
            (Some(workshop), None)
        }
        _ => {
            let workshop_id = match clean(body.workshop_id) {
                Some(workshop_id) => {
                    let workshop = state.db.get_workshop(&workshop_id).await?.ok_or_else(|| {
                        AppError::NotFound(format!("Workshop {} not found", workshop_id))
                    })?;
                    let contract = state.db.resolve_contract(&workshop).await?;
                    let drivers = state.db.list_drivers_for_workshop(&workshop_id).await?;
                    contract.check_driver_capacity(drivers.len())?;
                    workshop_id
                }
                None => String::new(),
            };
            let driver = Driver {
                id: user_id.clone(),
                user_id: Some(user_id.clone()),
                name: body.name.trim().to_string(),
                email: email.clone(),
                phone: clean(body.phone),
                workshop_id,
                created_at: now.clone(),
            };
            (None, Some(driver))
        }
    };

    let user = User {
        id: user_id,
        email,
        name: body.name.trim().to_string(),
        role: body.role,
        workshop_id: workshop
            .as_ref()
            .map(|w| w.id.clone())
            .or_else(|| driver.as_ref().and_then(|d| d.workshop()).map(str::to_string)),
        password_hash: hash_password(body.password).await?,
        created_at: now,
    };

    state
        .db
        .create_account(&user, workshop.as_ref(), driver.as_ref())
        .await?;

    let (jar, response) = session_response(&state, jar, user)?;
    Ok((StatusCode::CREATED, jar, response))
}

/// Log in with e-mail and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let body = validated(body)?;
    let email = body.email.trim().to_lowercase();

    let Some(mut user) = state.db.find_user_by_email(&email).await? else {
        tracing::info!(email = %email, "Login for unknown account");
        return Err(AppError::Unauthorized);
    };

    if !verify_password(body.password, user.password_hash.clone()).await? {
        tracing::info!(user_id = %user.id, "Login with wrong password");
        return Err(AppError::Unauthorized);
    }

    // Drivers can be associated after registration; refresh the claim.
    if user.role == Role::User {
        if let Some(driver) = state.db.get_driver(&user.id).await? {
            let current = driver.workshop().map(str::to_string);
            if current != user.workshop_id {
                user.workshop_id = current;
                state.db.upsert_user(&user).await?;
            }
        }
    }

    tracing::info!(user_id = %user.id, role = ?user.role, "User logged in");
    session_response(&state, jar, user)
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}
