// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment and read
//! once at startup.

use std::env;

/// Default base URL of the FIPE vehicle reference API.
pub const DEFAULT_VEHICLE_LOOKUP_URL: &str = "https://parallelum.com.br/fipe/api/v1";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Sender address for e-mailed maintenance reports
    pub mail_from: String,
    /// Base URL of the vehicle make/model/year API
    pub vehicle_lookup_url: String,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Shared secret telemetry devices sign reading payloads with
    pub device_ingest_secret: Vec<u8>,
    /// Google Calendar API bearer token. `None` disables calendar mirroring.
    pub calendar_api_token: Option<String>,
    /// Transactional e-mail API key. `None` disables e-mailed reports.
    pub mail_api_key: Option<String>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            mail_from: "oficina@example.com".to_string(),
            vehicle_lookup_url: DEFAULT_VEHICLE_LOOKUP_URL.to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            device_ingest_secret: b"test_device_secret".to_vec(),
            calendar_api_token: None,
            mail_api_key: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// For local development, a `.env` file in the working directory is
    /// loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@localhost".to_string()),
            vehicle_lookup_url: env::var("VEHICLE_LOOKUP_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_VEHICLE_LOOKUP_URL.to_string()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            device_ingest_secret: required_secret(
                "DEVICE_INGEST_SECRET",
                env::var("DEVICE_INGEST_SECRET").ok(),
            )?
            .into_bytes(),
            calendar_api_token: optional_secret("CALENDAR_API_TOKEN"),
            mail_api_key: optional_secret("MAIL_API_KEY"),
        })
    }
}

/// Trim a required secret; blank counts as missing.
fn required_secret(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Read an optional secret, treating empty values as unset.
fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
