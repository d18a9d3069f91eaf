// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile + embedded wallet)
//! - Challenges (definitions + redemption sets)
//! - Rewards (read-only catalog)
//! - Transactions (append-only ledger records)
//!
//! Every wallet mutation runs inside a Firestore transaction that commits the
//! user document and the new ledger record together, so a crash can never
//! leave a balance change without its audit record (or the reverse).

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    Challenge, LedgerTransaction, Reward, TransactionKind, User,
};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Direction of a wallet balance change.
#[derive(Debug, Clone, Copy)]
pub enum WalletDelta {
    Credit(u64),
    Debit(u64),
}

/// Result of a committed wallet mutation.
#[derive(Debug, Clone)]
pub struct WalletUpdate {
    pub new_balance: u64,
    pub transaction: LedgerTransaction,
}

/// Result of a committed challenge redemption.
#[derive(Debug, Clone)]
pub struct ChallengeRedemption {
    /// The challenge, now including the redeeming user
    pub challenge: Challenge,
    pub new_balance: u64,
    pub transaction: LedgerTransaction,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their Google subject ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Challenge Operations ────────────────────────────────────

    /// Get a challenge by ID.
    pub async fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGES)
            .obj()
            .one(challenge_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all challenge definitions, newest first.
    pub async fn list_challenges(&self) -> Result<Vec<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGES)
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a challenge definition (admin/seed path).
    pub async fn upsert_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGES)
            .document_id(&challenge.challenge_id)
            .object(challenge)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Reward Catalog Operations ───────────────────────────────

    /// List the reward catalog, cheapest first.
    pub async fn list_rewards(&self) -> Result<Vec<Reward>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REWARDS)
            .order_by([("cost", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a catalog item (admin/seed path).
    pub async fn upsert_reward(&self, reward: &Reward) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::REWARDS)
            .document_id(&reward.reward_id)
            .object(reward)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Ledger Record Operations ────────────────────────────────

    /// Get a single ledger record by ID.
    pub async fn get_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<LedgerTransaction>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRANSACTIONS)
            .obj()
            .one(transaction_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch ledger records for a list of wallet references, preserving the
    /// input order.
    ///
    /// Uses bounded-concurrency lookups. References whose document is missing
    /// are skipped with a warning; the wallet list is authoritative but the
    /// read path stays tolerant.
    pub async fn get_transactions_by_ids(
        &self,
        transaction_ids: &[String],
    ) -> Result<Vec<LedgerTransaction>, AppError> {
        let client = self.get_client()?;

        let results: Vec<Result<Option<LedgerTransaction>, AppError>> =
            stream::iter(transaction_ids.to_vec())
                .map(|id| async move {
                    client
                        .fluent()
                        .select()
                        .by_id_in(collections::TRANSACTIONS)
                        .obj()
                        .one(&id)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))
                })
                // buffered (not buffer_unordered) keeps wallet ordering intact
                .buffered(MAX_CONCURRENT_DB_OPS)
                .collect()
                .await;

        let mut transactions = Vec::with_capacity(transaction_ids.len());
        for (id, result) in transaction_ids.iter().zip(results) {
            match result? {
                Some(tx) => transactions.push(tx),
                None => {
                    tracing::warn!(transaction_id = %id, "Wallet references a missing ledger record");
                }
            }
        }

        Ok(transactions)
    }

    // ─── Atomic Ledger Mutations ─────────────────────────────────

    /// Atomically redeem a challenge for a user.
    ///
    /// Inside one Firestore transaction: checks the challenge's redeemed set,
    /// adds the user to it, credits the wallet by the reward amount, and
    /// appends a `reward` ledger record. All three documents commit together;
    /// if a concurrent request touches the same documents, Firestore retries
    /// with fresh data, so two requests for the same `(user, challenge)` pair
    /// cannot both pass the membership check.
    pub async fn redeem_challenge_atomic(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<ChallengeRedemption, AppError> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Read the challenge within the transaction
        //    This registers the document for conflict detection
        let challenge: Option<Challenge> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGES)
            .obj()
            .one(challenge_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read challenge in transaction: {}", e))
            })?;

        let Some(mut challenge) = challenge else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "Challenge {} not found",
                challenge_id
            )));
        };

        // 2. Duplicate-redemption guard
        if challenge.is_redeemed_by(user_id) {
            tracing::debug!(user_id, challenge_id, "Duplicate redemption rejected");
            let _ = transaction.rollback().await;
            return Err(AppError::AlreadyRedeemed);
        }

        // 3. Read the user
        let user: Option<User> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read user in transaction: {}", e))
            })?;

        let Some(mut user) = user else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        };

        // 4. Apply the mutation in memory
        challenge.redeemed_by.insert(user_id.to_string());
        user.redeemed_challenges.insert(challenge_id.to_string());

        let record = LedgerTransaction::completed(
            user_id,
            TransactionKind::Reward,
            challenge.reward_coins,
            &challenge.title,
            &now,
        )
        .for_challenge(challenge_id);

        let new_balance = user.wallet.credit(challenge.reward_coins);
        user.wallet.record(&record.transaction_id);

        // 5. Stage all three writes
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGES)
            .document_id(challenge_id)
            .object(&challenge)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add challenge to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::TRANSACTIONS)
            .document_id(&record.transaction_id)
            .object(&record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add ledger record to transaction: {}", e))
            })?;

        // 6. Commit atomically
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id,
            challenge_id,
            reward = challenge.reward_coins,
            new_balance,
            "Challenge redeemed atomically"
        );

        Ok(ChallengeRedemption {
            challenge,
            new_balance,
            transaction: record,
        })
    }

    /// Atomically apply a balance change to a user's wallet.
    ///
    /// This is the single write path for every non-redemption balance change:
    /// the wallet update and its ledger record always commit together, so the
    /// transaction list stays a complete audit trail. Debits are checked
    /// against the balance inside the transaction; a concurrent mutation of
    /// the same user forces a retry on fresh data, so two spends cannot both
    /// observe the same starting balance.
    pub async fn mutate_wallet_atomic(
        &self,
        user_id: &str,
        delta: WalletDelta,
        kind: TransactionKind,
        reference: &str,
        challenge_id: Option<&str>,
    ) -> Result<WalletUpdate, AppError> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Read the user within the transaction
        let user: Option<User> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read user in transaction: {}", e))
            })?;

        let Some(mut user) = user else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        };

        // 2. Apply the delta in memory
        let amount = match delta {
            WalletDelta::Credit(amount) => amount,
            WalletDelta::Debit(amount) => amount,
        };

        let new_balance = match delta {
            WalletDelta::Credit(amount) => user.wallet.credit(amount),
            WalletDelta::Debit(amount) => match user.wallet.debit(amount) {
                Some(balance) => balance,
                None => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::InsufficientBalance {
                        balance: user.wallet.balance,
                        requested: amount,
                    });
                }
            },
        };

        let mut record = LedgerTransaction::completed(user_id, kind, amount, reference, &now);
        if let Some(challenge_id) = challenge_id {
            record = record.for_challenge(challenge_id);
        }
        user.wallet.record(&record.transaction_id);

        // 3. Stage user and ledger writes
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::TRANSACTIONS)
            .document_id(&record.transaction_id)
            .object(&record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add ledger record to transaction: {}", e))
            })?;

        // 4. Commit atomically
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id,
            ?kind,
            amount,
            new_balance,
            "Wallet mutated atomically"
        );

        Ok(WalletUpdate {
            new_balance,
            transaction: record,
        })
    }
}
