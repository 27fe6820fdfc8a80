//! Error types for the ledger core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("difficulty {0} out of range (must be below 64)")]
    DifficultyOutOfRange(u32),

    #[error("no nonce found for block {position} after {attempts} attempts")]
    NonceNotFound { position: u64, attempts: u64 },

    #[error("chain is empty")]
    EmptyChain,

    #[error("block {position} rejected: {reason}")]
    Rejected { position: u64, reason: String },
}
