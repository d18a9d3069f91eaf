// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Reward catalog model.

use serde::{Deserialize, Serialize};

/// Catalog item purchasable with coins.
///
/// The catalog is read-only for end users; purchases go through the spend
/// path with the reward title as the transaction reference. Linking a spend
/// to a specific catalog item atomically is an open gap carried over from the
/// product design (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    /// Reward ID (also used as document ID)
    pub reward_id: String,
    /// Short title (e.g. "Coffee Voucher")
    pub title: String,
    /// Longer description
    pub description: String,
    /// Coin cost
    pub cost: u64,
}
