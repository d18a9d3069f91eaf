//! User and wallet models for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Google subject claim (also used as document ID)
    pub user_id: String,
    /// Email address from the Google account
    pub email: String,
    /// Display name
    pub name: String,
    /// Profile picture URL
    pub picture: Option<String>,
    /// Coin wallet. Documents written before the wallet feature existed
    /// deserialize as an empty wallet with zero balance.
    #[serde(default)]
    pub wallet: Wallet,
    /// Challenge IDs this user has redeemed
    #[serde(default)]
    pub redeemed_challenges: HashSet<String>,
    /// When the user first signed in
    pub created_at: String,
    /// Last sign-in timestamp
    pub last_active: String,
}

impl User {
    /// Build a fresh profile for a first sign-in, with an empty wallet.
    pub fn new_from_google(
        subject: &str,
        email: &str,
        name: &str,
        picture: Option<String>,
        now: &str,
    ) -> Self {
        Self {
            user_id: subject.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            picture,
            wallet: Wallet::default(),
            redeemed_challenges: HashSet::new(),
            created_at: now.to_string(),
            last_active: now.to_string(),
        }
    }
}

/// Per-user coin balance plus the ordered list of ledger transaction
/// references that produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wallet {
    /// Current coin balance (never negative)
    #[serde(default)]
    pub balance: u64,
    /// Ledger transaction IDs, oldest first
    #[serde(default)]
    pub transactions: Vec<String>,
}

impl Wallet {
    /// Credit coins and return the new balance.
    pub fn credit(&mut self, amount: u64) -> u64 {
        self.balance = self.balance.saturating_add(amount);
        self.balance
    }

    /// Debit coins and return the new balance.
    ///
    /// Returns `None` without mutating when the balance is too low.
    pub fn debit(&mut self, amount: u64) -> Option<u64> {
        self.balance = self.balance.checked_sub(amount)?;
        Some(self.balance)
    }

    /// Append a ledger transaction reference to the history.
    pub fn record(&mut self, transaction_id: &str) {
        self.transactions.push(transaction_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_increases_balance() {
        let mut wallet = Wallet::default();
        assert_eq!(wallet.credit(50), 50);
        assert_eq!(wallet.credit(25), 75);
    }

    #[test]
    fn test_debit_decreases_balance() {
        let mut wallet = Wallet {
            balance: 50,
            transactions: vec![],
        };
        assert_eq!(wallet.debit(30), Some(20));
        assert_eq!(wallet.balance, 20);
    }

    #[test]
    fn test_debit_rejects_overdraft_without_mutating() {
        let mut wallet = Wallet {
            balance: 20,
            transactions: vec![],
        };
        assert_eq!(wallet.debit(25), None);
        assert_eq!(
            wallet.balance, 20,
            "Failed debit must leave balance unchanged"
        );
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut wallet = Wallet::default();
        wallet.record("tx-1");
        wallet.record("tx-2");
        assert_eq!(wallet.transactions, vec!["tx-1", "tx-2"]);
    }

    #[test]
    fn test_old_document_deserializes_with_empty_wallet() {
        // Users created before the wallet feature have no wallet field at all.
        let raw = r#"{
            "user_id": "sub-1",
            "email": "a@example.com",
            "name": "A",
            "picture": null,
            "created_at": "2024-01-01T00:00:00Z",
            "last_active": "2024-01-01T00:00:00Z"
        }"#;

        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.wallet.balance, 0);
        assert!(user.wallet.transactions.is_empty());
        assert!(user.redeemed_challenges.is_empty());
    }
}
