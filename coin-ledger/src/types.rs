//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic hashing (see [`crate::canonical`])
//! - Lossless JSON persistence (hex for keys, signatures and hashes)
//! - Integer amounts (no fractional units)

use crate::canonical;
use crate::crypto::KeyPair;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest
pub type Hash = [u8; 32];

/// `previous_hash` of the genesis block
pub const GENESIS_PREVIOUS_HASH: Hash = [0u8; 32];

/// Ledger identity: an Ed25519 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 32]);

impl Identity {
    /// Wrap raw public key bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from 64 hex characters
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| Error::Key(format!("Invalid identity hex: {}", e)))?;
        Ok(Self(bytes))
    }

    /// Raw public key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex chars, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.short())
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identity::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Digital signature (Ed25519)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..4]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(&s, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

/// Hex (de)serialization for [`Hash`] fields
mod hex_hash {
    use super::Hash;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut hash = [0u8; 32];
        hex::decode_to_slice(&s, &mut hash).map_err(serde::de::Error::custom)?;
        Ok(hash)
    }
}

/// A single value transfer
///
/// `from == None` marks an issuance transaction. Issuance is only created
/// while building the genesis block and is never accepted from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Sender (None for issuance)
    pub from: Option<Identity>,

    /// Recipient
    pub to: Identity,

    /// Amount in whole units
    pub amount: u64,

    /// Sender's signature over [`TransactionRecord::signing_payload`]
    pub signature: Option<Signature>,
}

impl TransactionRecord {
    /// Trusted issuance (genesis funding)
    pub fn issuance(to: Identity, amount: u64) -> Self {
        Self {
            from: None,
            to,
            amount,
            signature: None,
        }
    }

    /// Unsigned transfer
    pub fn transfer(from: Identity, to: Identity, amount: u64) -> Self {
        Self {
            from: Some(from),
            to,
            amount,
            signature: None,
        }
    }

    /// Transfer from `keypair`'s identity, signed
    pub fn signed_transfer(keypair: &KeyPair, to: Identity, amount: u64) -> Self {
        let mut tx = Self::transfer(keypair.identity(), to, amount);
        tx.signature = Some(keypair.sign(&tx.signing_payload()));
        tx
    }

    /// Sign with raw secret key bytes
    pub fn sign(mut self, secret_key: &[u8]) -> Result<Self> {
        self.signature = Some(crate::crypto::sign(&self.signing_payload(), secret_key)?);
        Ok(self)
    }

    /// True for sender-less issuance
    pub fn is_issuance(&self) -> bool {
        self.from.is_none()
    }

    /// Signature check against the sender's own key
    ///
    /// Issuance has no sender and always passes; whether issuance is allowed
    /// at all is decided by the caller.
    pub fn verify_signature(&self) -> bool {
        match (&self.from, &self.signature) {
            (None, _) => true,
            (Some(from), Some(signature)) => {
                crate::crypto::verify(&self.signing_payload(), from, signature)
            }
            (Some(_), None) => false,
        }
    }

    /// Verify the signature and bind the verdict to the record
    ///
    /// This is the only way to obtain a [`CheckedTransaction`], so admission
    /// never trusts a verdict the caller made up.
    pub fn check_signature(self) -> CheckedTransaction {
        let signature_valid = self.verify_signature();
        CheckedTransaction {
            tx: self,
            signature_valid,
        }
    }
}

/// Transaction paired with the outcome of its signature check
///
/// Verification is CPU bound and side-effect free, so it runs on the
/// submitter's task; only this value enters the serialized admission step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedTransaction {
    tx: TransactionRecord,
    signature_valid: bool,
}

impl CheckedTransaction {
    /// The checked record
    pub fn record(&self) -> &TransactionRecord {
        &self.tx
    }

    /// Signature verified against the sender's key
    pub fn signature_valid(&self) -> bool {
        self.signature_valid
    }

    /// Release the record
    pub fn into_record(self) -> TransactionRecord {
        self.tx
    }
}

/// Committed batch of transactions
///
/// Fields are private: the hash is computed once in [`Block::new`] and the
/// block cannot be edited afterwards. Field order matches the persisted
/// format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    index: u64,

    /// Unix milliseconds
    timestamp: i64,

    transactions: Vec<TransactionRecord>,

    #[serde(with = "hex_hash")]
    previous_hash: Hash,

    #[serde(with = "hex_hash")]
    hash: Hash,
}

impl Block {
    /// Build a block and freeze its hash
    pub fn new(
        index: u64,
        timestamp: i64,
        transactions: Vec<TransactionRecord>,
        previous_hash: Hash,
    ) -> Self {
        let hash = canonical::block_hash(index, &previous_hash, timestamp, &transactions);
        Self {
            index,
            timestamp,
            transactions,
            previous_hash,
            hash,
        }
    }

    /// Position in the chain
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Creation time (Unix milliseconds)
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Ordered transactions
    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    /// Hash of the predecessor (sentinel for genesis)
    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    /// Stored hash
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Hash recomputed from the stored fields
    pub fn recompute_hash(&self) -> Hash {
        canonical::block_hash(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.transactions,
        )
    }

    /// Stored hash matches contents
    pub fn is_intact(&self) -> bool {
        self.recompute_hash() == self.hash
    }

    /// Hex of the stored hash
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}
