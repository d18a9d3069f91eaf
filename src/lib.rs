// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Stride Rewards: earn coins for fitness challenges, spend them on rewards
//!
//! This crate provides the backend API for the coin ledger: challenge
//! redemption, wallet mutations, and the append-only transaction history.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{GoogleIdentityVerifier, LedgerService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub ledger: LedgerService,
    pub google_verifier: Arc<GoogleIdentityVerifier>,
}
