// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation tests.
//!
//! Every case here is rejected before the handler touches the database,
//! so they run against the offline mock.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fleet_workshop::models::Role;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_jwt};

async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = app
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let (app, _) = create_test_app();

    let (status, json) = send_json(
        app,
        "POST",
        "/auth/register",
        None,
        serde_json::json!({
            "name": "Oficina do Zé",
            "email": "not-an-email",
            "password": "senha-segura",
            "role": "organization",
            "workshop_name": "Oficina do Zé"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
    assert!(json["details"].as_str().unwrap().starts_with("email"));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (app, _) = create_test_app();

    let (status, _) = send_json(
        app,
        "POST",
        "/auth/register",
        None,
        serde_json::json!({
            "name": "Maria",
            "email": "maria@example.com",
            "password": "curta",
            "role": "user"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_refuses_master_role() {
    let (app, _) = create_test_app();

    let (status, json) = send_json(
        app,
        "POST",
        "/auth/register",
        None,
        serde_json::json!({
            "name": "Root",
            "email": "root@example.com",
            "password": "senha-segura",
            "role": "master"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["details"].as_str().unwrap().contains("master"));
}

#[tokio::test]
async fn test_login_rejects_invalid_email() {
    let (app, _) = create_test_app();

    let (status, _) = send_json(
        app,
        "POST",
        "/auth/login",
        None,
        serde_json::json!({"email": "nobody", "password": "x"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vehicle_year_out_of_range() {
    let (app, state) = create_test_app();
    let token = create_test_jwt(Role::User, None, &state.config.jwt_signing_key);

    let (status, json) = send_json(
        app,
        "POST",
        "/api/vehicles",
        Some(&token),
        serde_json::json!({
            "plate": "ABC1D23",
            "brand": "Fiat",
            "model": "Uno",
            "year": 1850
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["details"].as_str().unwrap().starts_with("year"));
}

#[tokio::test]
async fn test_vehicle_negative_initial_km() {
    let (app, state) = create_test_app();
    let token = create_test_jwt(Role::User, None, &state.config.jwt_signing_key);

    let (status, json) = send_json(
        app,
        "POST",
        "/api/vehicles",
        Some(&token),
        serde_json::json!({
            "plate": "ABC1D23",
            "brand": "Fiat",
            "model": "Uno",
            "year": 2015,
            "initial_km": -10.0
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["details"].as_str().unwrap().contains("initial_km"));
}

#[tokio::test]
async fn test_schedule_start_must_precede_end() {
    let (app, state) = create_test_app();
    let token = create_test_jwt(
        Role::Organization,
        Some("oficina-1"),
        &state.config.jwt_signing_key,
    );

    for (start, end) in [
        ("2026-06-01T10:00:00Z", "2026-06-01T09:00:00Z"),
        ("2026-06-01T10:00:00Z", "2026-06-01T10:00:00Z"),
    ] {
        let (status, _) = send_json(
            app.clone(),
            "POST",
            "/api/schedules",
            Some(&token),
            serde_json::json!({"maintenance_id": "m1", "start": start, "end": end}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} .. {}", start, end);
    }
}

#[tokio::test]
async fn test_schedule_rejects_unparseable_time() {
    let (app, state) = create_test_app();
    let token = create_test_jwt(
        Role::Organization,
        Some("oficina-1"),
        &state.config.jwt_signing_key,
    );

    let (status, json) = send_json(
        app,
        "POST",
        "/api/schedules",
        Some(&token),
        serde_json::json!({
            "maintenance_id": "m1",
            "start": "amanhã às 9",
            "end": "2026-06-01T10:00:00Z"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["details"].as_str().unwrap().contains("start"));
}

#[tokio::test]
async fn test_maintenance_negative_price() {
    let (app, state) = create_test_app();
    let token = create_test_jwt(
        Role::Organization,
        Some("oficina-1"),
        &state.config.jwt_signing_key,
    );

    let (status, _) = send_json(
        app,
        "POST",
        "/api/maintenances",
        Some(&token),
        serde_json::json!({
            "vehicle_id": "v1",
            "service": "Troca de pastilhas",
            "price": -1.0
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_requires_pdf_body() {
    let (app, state) = create_test_app();
    let token = create_test_jwt(
        Role::Organization,
        Some("oficina-1"),
        &state.config.jwt_signing_key,
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/maintenances/m1/report")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/pdf")
                .body(Body::from("<html>not a pdf</html>"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lookup_rejects_non_numeric_codes() {
    let (app, state) = create_test_app();
    let token = create_test_jwt(Role::User, None, &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/lookup/brands/fiat/models")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
