// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response checking shared by the outbound API clients.

use crate::error::AppError;
use serde::de::DeserializeOwned;

/// Check response status and return error if not successful.
pub async fn check_response(service: &str, response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(error_from(service, response).await)
}

/// Check response and parse JSON body.
pub async fn check_response_json<T: DeserializeOwned>(
    service: &str,
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        return Err(error_from(service, response).await);
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AppError::ExternalApi(format!("{}: invalid response body: {}", service, e)))
}

async fn error_from(service: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        tracing::warn!(service, "Rate limit hit (429)");
        return AppError::ExternalApi(format!("{}: rate limited", service));
    }

    tracing::warn!(service, status = %status, body = %body, "External API request failed");
    AppError::ExternalApi(format!("{}: HTTP {}", service, status))
}

/// Map a transport error (DNS, TLS, timeout) to an application error.
pub fn transport_error(service: &str, e: reqwest::Error) -> AppError {
    AppError::ExternalApi(format!("{}: request failed: {}", service, e))
}
