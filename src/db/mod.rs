//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{ChallengeRedemption, FirestoreDb, WalletDelta, WalletUpdate};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CHALLENGES: &str = "challenges";
    pub const REWARDS: &str = "rewards";
    /// Append-only ledger records (keyed by transaction UUID)
    pub const TRANSACTIONS: &str = "transactions";
}
