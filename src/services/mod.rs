// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Services module - business logic layer.

pub mod google_identity;
pub mod ledger;

pub use google_identity::{GoogleIdentityVerifier, IdentityError, VerifiedGoogleUser};
pub use ledger::LedgerService;
