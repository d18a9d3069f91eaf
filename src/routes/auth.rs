// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Google sign-in route.
//!
//! The frontend obtains an ID token from Google Identity Services and posts
//! it here; we verify it, create the user on first sign-in, and hand back a
//! session JWT.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::models::User;
use crate::routes::api::UserResponse;
use crate::services::IdentityError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/google", post(google_login))
}

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    /// Raw ID token from Google Identity Services
    pub id_token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    /// Session JWT for subsequent API calls
    pub token: String,
    pub user: UserResponse,
}

/// Sign in with a Google ID token, creating the user on first login.
async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<Json<LoginResponse>> {
    let verified = state
        .google_verifier
        .verify_id_token(&req.id_token)
        .await
        .map_err(|e| match e {
            IdentityError::Rejected(msg) => {
                tracing::warn!(reason = %msg, "Google ID token rejected");
                AppError::InvalidToken
            }
            IdentityError::Transient(msg) => AppError::GoogleAuth(msg),
        })?;

    let now = chrono::Utc::now().to_rfc3339();

    let user = match state.db.get_user(&verified.subject).await? {
        Some(mut existing) => {
            // Re-login: refresh profile fields only. The wallet and the
            // redemption set belong to the ledger and must survive untouched.
            existing.email = verified.email;
            if let Some(name) = verified.name {
                existing.name = name;
            }
            if verified.picture.is_some() {
                existing.picture = verified.picture;
            }
            existing.last_active = now;
            state.db.upsert_user(&existing).await?;
            existing
        }
        None => {
            let user = User::new_from_google(
                &verified.subject,
                &verified.email,
                verified.name.as_deref().unwrap_or(&verified.email),
                verified.picture,
                &now,
            );
            state.db.upsert_user(&user).await?;
            tracing::info!(user_id = %user.user_id, "First sign-in, user created");
            user
        }
    };

    let token = create_jwt(&user.user_id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from_user(&user),
    }))
}
