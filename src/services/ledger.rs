// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Coin ledger service.
//!
//! Handles the core workflow:
//! 1. Validate the request (amounts, references, IDs) before touching storage
//! 2. Apply the balance change atomically through the database layer
//! 3. Return the updated balance and the ledger record that documents it
//!
//! Every operation takes the acting user ID as an explicit parameter; there
//! is no ambient request-scoped identity below the handler layer.

use crate::db::{ChallengeRedemption, FirestoreDb, WalletDelta, WalletUpdate};
use crate::error::{AppError, Result};
use crate::models::TransactionKind;

/// Reference text used for grants arriving through the add-coins path.
const ADD_COINS_REFERENCE: &str = "Coins added";

/// Validated balance mutations and transaction recording.
#[derive(Clone)]
pub struct LedgerService {
    db: FirestoreDb,
}

impl LedgerService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Redeem a challenge for a user.
    ///
    /// Fails with `NotFound` for an unknown challenge or user and with
    /// `AlreadyRedeemed` when the user is already in the challenge's
    /// redeemed set. On success the user is added to the set, the wallet is
    /// credited with the reward amount, and a `reward` ledger record is
    /// committed in the same transaction.
    pub async fn redeem_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<ChallengeRedemption> {
        if challenge_id.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Challenge ID must not be empty".to_string(),
            ));
        }

        self.db.redeem_challenge_atomic(user_id, challenge_id).await
    }

    /// Spend coins from a user's wallet.
    ///
    /// `amount` must be positive and `reference` non-empty; both are checked
    /// before any storage call. Fails with `InsufficientBalance` (leaving the
    /// balance unchanged) when the wallet cannot cover the amount.
    pub async fn spend_coins(
        &self,
        user_id: &str,
        amount: u64,
        reference: &str,
    ) -> Result<WalletUpdate> {
        if amount == 0 {
            return Err(AppError::BadRequest(
                "Amount must be a positive number".to_string(),
            ));
        }
        if reference.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Reference must not be empty".to_string(),
            ));
        }

        self.db
            .mutate_wallet_atomic(
                user_id,
                WalletDelta::Debit(amount),
                TransactionKind::Spend,
                reference.trim(),
                None,
            )
            .await
    }

    /// Grant coins to a user (reward-grant path).
    ///
    /// Goes through the same atomic mutation path as spending, so the grant
    /// always produces an `earn` ledger record.
    pub async fn add_coins(&self, user_id: &str, amount: u64) -> Result<WalletUpdate> {
        if amount == 0 {
            return Err(AppError::BadRequest(
                "Amount must be a positive number".to_string(),
            ));
        }

        self.db
            .mutate_wallet_atomic(
                user_id,
                WalletDelta::Credit(amount),
                TransactionKind::Earn,
                ADD_COINS_REFERENCE,
                None,
            )
            .await
    }

    /// Read a user's current balance.
    pub async fn get_balance(&self, user_id: &str) -> Result<u64> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(user.wallet.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// With the offline mock database, any storage call fails with
    /// `Database`. A validation error instead proves the guard fired before
    /// storage was touched.
    fn offline_ledger() -> LedgerService {
        LedgerService::new(FirestoreDb::new_mock())
    }

    #[tokio::test]
    async fn test_spend_zero_amount_rejected_before_storage() {
        let ledger = offline_ledger();
        let err = ledger.spend_coins("sub-1", 0, "Coffee").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_spend_blank_reference_rejected_before_storage() {
        let ledger = offline_ledger();
        let err = ledger.spend_coins("sub-1", 10, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_add_zero_amount_rejected_before_storage() {
        let ledger = offline_ledger();
        let err = ledger.add_coins("sub-1", 0).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_redeem_blank_challenge_id_rejected_before_storage() {
        let ledger = offline_ledger();
        let err = ledger.redeem_challenge("sub-1", "  ").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_valid_spend_reaches_storage() {
        // Valid input must get past validation; with the mock database the
        // next failure is the storage layer itself.
        let ledger = offline_ledger();
        let err = ledger.spend_coins("sub-1", 10, "Coffee").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
