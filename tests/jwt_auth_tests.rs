// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! JWT session token tests.
//!
//! These tests verify that tokens created by the auth route can be decoded
//! by the auth middleware, catching compatibility issues early.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use stride_rewards::middleware::auth::create_jwt;

/// Claims structure that must match what the middleware expects.
/// This is the canonical format - if either create_jwt or the middleware
/// changes, this test should catch the incompatibility.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

#[test]
fn test_jwt_roundtrip() {
    let signing_key = b"test_signing_key_32_bytes_long!!";
    let user_id = "google-sub-108293";

    // Create token (like the login route does)
    let token = create_jwt(user_id, signing_key).expect("Failed to create JWT");

    // Decode token (like the middleware does)
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(&token, &key, &validation)
        .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, user_id);
    assert!(token_data.claims.exp > token_data.claims.iat);
}

#[test]
fn test_jwt_rejected_with_wrong_key() {
    let token = create_jwt("google-sub-1", b"correct_key_32_bytes_long_here!!").unwrap();

    let wrong_key = DecodingKey::from_secret(b"wrong_key_32_bytes_long_here!!!!");
    let validation = Validation::new(Algorithm::HS256);

    assert!(
        decode::<Claims>(&token, &wrong_key, &validation).is_err(),
        "Token signed with a different key must not validate"
    );
}

#[test]
fn test_jwt_expiration_is_future() {
    use std::time::{SystemTime, UNIX_EPOCH};

    let signing_key = b"test_signing_key_32_bytes_long!!";
    let token = create_jwt("google-sub-1", signing_key).unwrap();

    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false; // We'll check manually

    let token_data = decode::<Claims>(&token, &key, &validation).unwrap();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    // Token should expire at least 29 days in the future
    assert!(
        token_data.claims.exp > now + 86400 * 29,
        "Token expiration should be ~30 days in the future"
    );
}
