//! Error types for the ledger

use crate::types::Identity;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reason a transaction or mine request was turned away.
///
/// Rejections are ordinary outcomes of admission control, not failures of the
/// ledger itself. They are cheap to clone so they can travel back over the
/// actor's reply channel and into metrics labels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Sender or recipient is not a registered identity
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Transfers must move a positive amount
    #[error("Invalid amount: transfers must move a positive amount")]
    InvalidAmount,

    /// Amount fits the committed balance but not what is left after pending spends
    #[error(
        "Double spend suspected: {sender} requested {requested} but only {available} is unreserved"
    )]
    DoubleSpendSuspected {
        /// Sending identity
        sender: Identity,
        /// Requested amount
        requested: u64,
        /// Committed balance minus pending reservations
        available: i128,
    },

    /// Amount exceeds the committed balance
    #[error("Insufficient balance: {sender} requested {requested} but holds {balance}")]
    InsufficientBalance {
        /// Sending identity
        sender: Identity,
        /// Requested amount
        requested: u64,
        /// Committed balance
        balance: i128,
    },

    /// Signature missing or not produced by the sender's key
    #[error("Invalid signature")]
    InvalidSignature,

    /// Nothing to mine
    #[error("No pending transactions to mine")]
    EmptyPendingPool,
}

impl Rejection {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::InvalidIdentity(_) => "invalid_identity",
            Rejection::InvalidAmount => "invalid_amount",
            Rejection::DoubleSpendSuspected { .. } => "double_spend_suspected",
            Rejection::InsufficientBalance { .. } => "insufficient_balance",
            Rejection::InvalidSignature => "invalid_signature",
            Rejection::EmptyPendingPool => "empty_pending_pool",
        }
    }
}

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Admission control turned the request away
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    /// Hash, linkage, signature or balance mismatch in a chain
    #[error("Corrupt chain at block {index}: {reason}")]
    CorruptChain {
        /// Index of the first offending block
        index: u64,
        /// What failed
        reason: String,
    },

    /// Malformed key material
    #[error("Key error: {0}")]
    Key(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Admission rejection carried by this error, if any
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Error::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    pub(crate) fn corrupt(index: u64, reason: impl Into<String>) -> Self {
        Error::CorruptChain {
            index,
            reason: reason.into(),
        }
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}
