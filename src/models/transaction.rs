// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Ledger transaction model.
//!
//! A transaction is the immutable audit record of exactly one balance change.
//! Records are only ever inserted, never updated or deleted.

use serde::{Deserialize, Serialize};

/// What kind of balance change a ledger entry documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Coins granted outside a challenge (e.g. the add-coins path)
    Earn,
    /// Coins deducted for a reward purchase
    Spend,
    /// Coins moved between users
    Transfer,
    /// Coins granted for completing a challenge
    Reward,
}

impl TransactionKind {
    /// Wire/display name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Earn => "earn",
            TransactionKind::Spend => "spend",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Reward => "reward",
        }
    }
}

/// Settlement status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    /// Wire/display name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Stored ledger transaction in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Transaction ID (UUID v4, also used as document ID)
    pub transaction_id: String,
    /// Owning user ID
    pub user_id: String,
    /// Kind of balance change
    pub kind: TransactionKind,
    /// Amount moved (strictly positive)
    pub amount: u64,
    /// Originating challenge, if any
    pub challenge_id: Option<String>,
    /// Free-text reason (e.g. "Redeemed reward: Coffee Voucher")
    pub reference: String,
    /// Settlement status
    pub status: TransactionStatus,
    /// When the record was created
    pub created_at: String,
}

impl LedgerTransaction {
    /// Build a completed ledger entry with a fresh UUID.
    ///
    /// Callers pass the same `now` timestamp used for the wallet write so the
    /// documents committed together carry one timestamp.
    pub fn completed(
        user_id: &str,
        kind: TransactionKind,
        amount: u64,
        reference: &str,
        now: &str,
    ) -> Self {
        Self {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            amount,
            challenge_id: None,
            reference: reference.to_string(),
            status: TransactionStatus::Completed,
            created_at: now.to_string(),
        }
    }

    /// Link this entry to the challenge that produced it.
    pub fn for_challenge(mut self, challenge_id: &str) -> Self {
        self.challenge_id = Some(challenge_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_constructor() {
        let tx = LedgerTransaction::completed(
            "sub-1",
            TransactionKind::Spend,
            30,
            "Redeemed reward: Coffee Voucher",
            "2024-01-15T10:00:00Z",
        );

        assert_eq!(tx.user_id, "sub-1");
        assert_eq!(tx.kind, TransactionKind::Spend);
        assert_eq!(tx.amount, 30);
        assert_eq!(tx.challenge_id, None);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert!(!tx.transaction_id.is_empty());
    }

    #[test]
    fn test_for_challenge_links_challenge() {
        let tx = LedgerTransaction::completed(
            "sub-1",
            TransactionKind::Reward,
            50,
            "Daily Steps",
            "2024-01-15T10:00:00Z",
        )
        .for_challenge("c-1");

        assert_eq!(tx.challenge_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let tx = LedgerTransaction::completed(
            "sub-1",
            TransactionKind::Reward,
            50,
            "Daily Steps",
            "2024-01-15T10:00:00Z",
        );

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["kind"], "reward");
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = LedgerTransaction::completed("u", TransactionKind::Earn, 1, "r", "now");
        let b = LedgerTransaction::completed("u", TransactionKind::Earn, 1, "r", "now");
        assert_ne!(a.transaction_id, b.transaction_id);
    }
}
