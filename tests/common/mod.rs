// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

use std::sync::Arc;
use stride_rewards::config::Config;
use stride_rewards::db::FirestoreDb;
use stride_rewards::routes::create_router;
use stride_rewards::services::{GoogleIdentityVerifier, LedgerService};
use stride_rewards::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a session JWT the way the auth route does.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    stride_rewards::middleware::auth::create_jwt(user_id, signing_key)
        .expect("Failed to create JWT")
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let ledger = LedgerService::new(db.clone());
    let google_verifier = Arc::new(
        GoogleIdentityVerifier::new(&config).expect("Failed to initialize verifier"),
    );

    let state = Arc::new(AppState {
        config,
        db,
        ledger,
        google_verifier,
    });

    (create_router(state.clone()), state)
}
