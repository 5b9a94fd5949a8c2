//! Fintrack Core Library
//!
//! Encrypted single-file document store, finance record types and the
//! repositories the server and CLI build on.

pub mod crypto;
pub mod models;
pub mod repo;
pub mod store;

pub use crypto::{CryptoError, DataCipher};
pub use models::{
    DebtAction, DebtHistoryEntry, Debtor, DebtorStatus, Investment, InvestmentStatus, PublicUser,
    Transaction, TransactionKind, User,
};
pub use repo::{
    DebtHistoryRepository, DebtorRepository, InvestmentRepository, RepoError,
    TransactionRepository, UserRepository,
};
pub use store::{
    Document, Encoding, JsonStore, Settings, StoreError, StoreOptions, StructureReport, Table,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
