// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! API input validation tests.
//!
//! All of these run against the offline mock database: a validation failure
//! must surface as 400 *before* any storage call (the mock would turn a
//! storage call into a 500).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

fn post_json(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_spend_zero_amount_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/transactions/spend",
            &token,
            r#"{"amount": 0, "reference": "Coffee"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_spend_negative_amount_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/transactions/spend",
            &token,
            r#"{"amount": -5, "reference": "Coffee"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_spend_empty_reference_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/transactions/spend",
            &token,
            r#"{"amount": 10, "reference": ""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_spend_missing_fields_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json("/api/transactions/spend", &token, r#"{}"#))
        .await
        .unwrap();

    // The body fails deserialization before the handler runs
    assert!(
        response.status().is_client_error(),
        "Expected a 4xx for a missing body, got {}",
        response.status()
    );
}

#[tokio::test]
async fn test_add_coins_zero_amount_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/users/add-coins",
            &token,
            r#"{"user_id": "test-user-1", "amount": 0}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_coins_blank_user_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(post_json(
            "/api/users/add-coins",
            &token,
            r#"{"user_id": "", "amount": 10}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_balance_blank_user_id_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/users/balance/%20")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transactions_page_zero_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/transactions?page=0")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_redeem_blank_challenge_id_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("test-user-1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/challenges/%20")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_empty_id_token_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"id_token": ""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
