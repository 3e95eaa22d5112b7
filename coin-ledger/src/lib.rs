//! Secure Coin Ledger
//!
//! Tamper-evident, append-only ledger of signed value transfers.
//!
//! # Architecture
//!
//! - **Hash-linked chain**: every block commits to its predecessor's hash
//! - **Derived balances**: replayed from history, never stored
//! - **Admission control**: identity, reservation-aware funds, signature
//! - **Single Writer**: one actor task owns the ledger and serializes
//!   admission and mining
//!
//! # Invariants
//!
//! - `chain[0].previous_hash` is the all-zero sentinel
//! - `chain[i].previous_hash == chain[i-1].hash` for `i > 0`
//! - Every stored hash equals the hash recomputed from its block
//! - Transfers conserve value; only genesis issues new units
//! - No sender can have more pending than their committed balance

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod canonical;
pub mod crypto;
pub mod identity;
pub mod ledger;
pub mod admission;
pub mod error;
pub mod actor;
pub mod storage;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Rejection, Result};
pub use types::{
    Block, CheckedTransaction, Hash, Identity, Signature, TransactionRecord, GENESIS_PREVIOUS_HASH,
};
pub use crypto::KeyPair;
pub use identity::IdentityRegistry;
pub use ledger::{verify_chain, Ledger};
pub use admission::AdmissionController;
pub use actor::{spawn_ledger_actor, ActorOptions, LedgerHandle};
pub use storage::FileChainStore;
pub use config::Config;
pub use metrics::Metrics;
