// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Fitness challenge model for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stored challenge definition in Firestore.
///
/// Challenges are created by an administrative action and mutated only by
/// adding a redeemer ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge ID (also used as document ID)
    pub challenge_id: String,
    /// Short title shown on the dashboard
    pub title: String,
    /// Longer description of what to accomplish
    pub description: String,
    /// Target metric name from Google Fit (e.g. "step_count", "calories")
    pub metric: String,
    /// Numeric target to reach
    pub target: u64,
    /// Unit label for the target (e.g. "steps", "kcal")
    pub unit: String,
    /// Coins granted on redemption
    pub reward_coins: u64,
    /// User IDs that have redeemed this challenge (at most once per user)
    #[serde(default)]
    pub redeemed_by: HashSet<String>,
    /// When the challenge was created
    pub created_at: String,
}

impl Challenge {
    /// Whether the given user already redeemed this challenge.
    pub fn is_redeemed_by(&self, user_id: &str) -> bool {
        self.redeemed_by.contains(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_challenge() -> Challenge {
        Challenge {
            challenge_id: "c-1".to_string(),
            title: "Daily Steps".to_string(),
            description: "Walk 10,000 steps in a day".to_string(),
            metric: "step_count".to_string(),
            target: 10_000,
            unit: "steps".to_string(),
            reward_coins: 50,
            redeemed_by: HashSet::new(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_redeemed_membership() {
        let mut challenge = make_challenge();
        assert!(!challenge.is_redeemed_by("sub-1"));

        challenge.redeemed_by.insert("sub-1".to_string());
        assert!(challenge.is_redeemed_by("sub-1"));
        assert!(!challenge.is_redeemed_by("sub-2"));
    }

    #[test]
    fn test_redeemed_set_holds_user_at_most_once() {
        let mut challenge = make_challenge();
        challenge.redeemed_by.insert("sub-1".to_string());
        challenge.redeemed_by.insert("sub-1".to_string());
        assert_eq!(challenge.redeemed_by.len(), 1);
    }
}
