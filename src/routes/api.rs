// SPDX-License-Identifier: MIT
// Copyright 2026 Stride Labs <dev@stride-rewards.app>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Challenge, LedgerTransaction, Reward, User};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/challenges", get(get_challenges))
        .route("/api/challenges/{id}", patch(redeem_challenge))
        .route("/api/rewards", get(get_rewards))
        .route("/api/transactions", get(get_transactions))
        .route("/api/transactions/spend", post(spend_coins))
        .route("/api/users/balance/{user_id}", get(get_user_balance))
        .route("/api/users/add-coins", post(add_coins))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub balance: u64,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
            balance: user.wallet.balance,
        }
    }
}

/// Get current user profile and balance.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse::from_user(&profile)))
}

// ─── Challenges ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengeSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub metric: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub target: u64,
    pub unit: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub reward_coins: u64,
    /// Whether the requesting user already redeemed this challenge
    pub is_redeemed: bool,
}

impl ChallengeSummary {
    fn annotate(challenge: &Challenge, user_id: &str) -> Self {
        Self {
            id: challenge.challenge_id.clone(),
            title: challenge.title.clone(),
            description: challenge.description.clone(),
            metric: challenge.metric.clone(),
            target: challenge.target,
            unit: challenge.unit.clone(),
            reward_coins: challenge.reward_coins,
            is_redeemed: challenge.is_redeemed_by(user_id),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChallengesResponse {
    pub challenges: Vec<ChallengeSummary>,
}

/// List all challenges, annotated with the caller's redemption state.
async fn get_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ChallengesResponse>> {
    tracing::debug!(user_id = %user.user_id, "Fetching challenges");

    let challenges = state
        .db
        .list_challenges()
        .await?
        .iter()
        .map(|c| ChallengeSummary::annotate(c, &user.user_id))
        .collect();

    Ok(Json(ChallengesResponse { challenges }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RedeemResponse {
    pub challenge: ChallengeSummary,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub new_balance: u64,
    pub message: String,
}

/// Redeem a challenge for the authenticated user.
async fn redeem_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<RedeemResponse>> {
    tracing::debug!(user_id = %user.user_id, challenge_id = %challenge_id, "Redeeming challenge");

    let redemption = state
        .ledger
        .redeem_challenge(&user.user_id, &challenge_id)
        .await?;

    let message = format!(
        "Challenge complete! {} coins added to your wallet",
        redemption.transaction.amount
    );

    Ok(Json(RedeemResponse {
        challenge: ChallengeSummary::annotate(&redemption.challenge, &user.user_id),
        new_balance: redemption.new_balance,
        message,
    }))
}

// ─── Reward Catalog ──────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub cost: u64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardsResponse {
    pub rewards: Vec<RewardSummary>,
}

/// List the reward catalog.
async fn get_rewards(State(state): State<Arc<AppState>>) -> Result<Json<RewardsResponse>> {
    let rewards = state
        .db
        .list_rewards()
        .await?
        .into_iter()
        .map(|r: Reward| RewardSummary {
            id: r.reward_id,
            title: r.title,
            description: r.description,
            cost: r.cost,
        })
        .collect();

    Ok(Json(RewardsResponse { rewards }))
}

// ─── Transaction History ─────────────────────────────────────

#[derive(Deserialize)]
struct TransactionsQuery {
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TransactionSummary {
    pub id: String,
    pub kind: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub amount: u64,
    pub challenge_id: Option<String>,
    pub reference: String,
    pub status: String,
    pub created_at: String,
}

impl TransactionSummary {
    fn from_record(tx: LedgerTransaction) -> Self {
        Self {
            id: tx.transaction_id,
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount,
            challenge_id: tx.challenge_id,
            reference: tx.reference,
            status: tx.status.as_str().to_string(),
            created_at: tx.created_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
}

/// Get the caller's transaction history, newest first.
///
/// The wallet's reference list is the source of truth, so the total is exact
/// and ordering matches the order balance changes were committed.
async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>> {
    if params.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }

    let limit = params.per_page.min(MAX_PER_PAGE);

    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    // Wallet references are stored oldest first; history is served newest first.
    let refs: Vec<String> = profile.wallet.transactions.iter().rev().cloned().collect();
    let total = refs.len() as u32;

    // Use checked multiplication to prevent overflow and cast to usize safely
    let start = (params.page as usize - 1)
        .checked_mul(limit as usize)
        .ok_or_else(|| AppError::BadRequest("Page number causes overflow".to_string()))?;

    let page_refs: &[String] = if start < refs.len() {
        let end = start.saturating_add(limit as usize).min(refs.len());
        &refs[start..end]
    } else {
        &[]
    };

    let transactions = state
        .db
        .get_transactions_by_ids(page_refs)
        .await?
        .into_iter()
        .map(TransactionSummary::from_record)
        .collect();

    Ok(Json(TransactionsResponse {
        transactions,
        page: params.page,
        per_page: limit,
        total,
    }))
}

// ─── Spend Coins ─────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct SpendRequest {
    /// Coins to deduct; must be positive
    #[validate(range(min = 1, message = "Amount must be a positive number"))]
    pub amount: i64,
    /// Human-readable reason (e.g. "Redeemed reward: Coffee Voucher")
    #[validate(length(min = 1, message = "Reference must not be empty"))]
    pub reference: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpendResponse {
    pub success: bool,
    pub message: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub balance: u64,
}

/// Spend coins from the authenticated user's wallet.
async fn spend_coins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SpendRequest>,
) -> Result<Json<SpendResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    tracing::debug!(
        user_id = %user.user_id,
        amount = req.amount,
        reference = %req.reference,
        "Spending coins"
    );

    let update = state
        .ledger
        .spend_coins(&user.user_id, req.amount as u64, &req.reference)
        .await?;

    Ok(Json(SpendResponse {
        success: true,
        message: format!("{} coins spent", update.transaction.amount),
        balance: update.new_balance,
    }))
}

// ─── Balance Query ───────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BalanceResponse {
    pub success: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub balance: u64,
}

/// Get the balance for an explicit user ID.
async fn get_user_balance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>> {
    if user_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "User ID must not be empty".to_string(),
        ));
    }

    let balance = state.ledger.get_balance(user_id.trim()).await?;

    Ok(Json(BalanceResponse {
        success: true,
        balance,
    }))
}

// ─── Add Coins ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct AddCoinsRequest {
    /// Target user for the grant
    #[validate(length(min = 1, message = "User ID must not be empty"))]
    pub user_id: String,
    /// Coins to grant; must be positive
    #[validate(range(min = 1, message = "Amount must be a positive number"))]
    pub amount: i64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AddCoinsResponse {
    pub success: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub new_balance: u64,
}

/// Grant coins to a user (reward-grant path, client-triggered).
///
/// The grant runs through the ledger like any other mutation, so it always
/// leaves an `earn` record behind.
async fn add_coins(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddCoinsRequest>,
) -> Result<Json<AddCoinsResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    tracing::debug!(user_id = %req.user_id, amount = req.amount, "Granting coins");

    let update = state
        .ledger
        .add_coins(&req.user_id, req.amount as u64)
        .await?;

    Ok(Json(AddCoinsResponse {
        success: true,
        new_balance: update.new_balance,
    }))
}
