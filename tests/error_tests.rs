// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use fleet_workshop::error::AppError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "unauthorized"),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED, "invalid_token"),
        (
            AppError::Forbidden("x".to_string()),
            StatusCode::FORBIDDEN,
            "forbidden",
        ),
        (
            AppError::LimitExceeded("x".to_string()),
            StatusCode::FORBIDDEN,
            "limit_exceeded",
        ),
        (
            AppError::NotFound("x".to_string()),
            StatusCode::NOT_FOUND,
            "not_found",
        ),
        (
            AppError::Conflict("x".to_string()),
            StatusCode::CONFLICT,
            "conflict",
        ),
        (
            AppError::BadRequest("x".to_string()),
            StatusCode::BAD_REQUEST,
            "bad_request",
        ),
        (
            AppError::ExternalApi("x".to_string()),
            StatusCode::BAD_GATEWAY,
            "external_api_error",
        ),
    ];

    for (err, status, code) in cases {
        let (got_status, json) = render(err).await;
        assert_eq!(got_status, status, "{}", code);
        assert_eq!(json["error"], code);
    }
}

#[tokio::test]
async fn test_limit_exceeded_carries_message() {
    let (_, json) = render(AppError::LimitExceeded(
        "contract allows 5 drivers".to_string(),
    ))
    .await;
    assert_eq!(json["details"], "contract allows 5 drivers");
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let (status, json) = render(AppError::Database("connection refused to 10.0.0.3".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "database_error");
    assert!(json.get("details").is_none());

    let (status, json) = render(AppError::Internal(anyhow::anyhow!("secret stack"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal_error");
    assert!(json.get("details").is_none());
}

#[derive(validator::Validate)]
struct SignupForm {
    #[validate(length(min = 2, message = "too short"))]
    name: String,
    #[validate(email(message = "not an e-mail"))]
    email: String,
    #[validate(range(min = 1900, max = 2100, message = "out of range"))]
    year: i32,
}

#[tokio::test]
async fn test_validation_reports_one_field_deterministically() {
    use validator::Validate;

    let form = SignupForm {
        name: "x".to_string(),
        email: "nope".to_string(),
        year: 1800,
    };

    for _ in 0..20 {
        let err: AppError = form.validate().unwrap_err().into();
        let (status, json) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["details"], "email: not an e-mail");
    }
}
