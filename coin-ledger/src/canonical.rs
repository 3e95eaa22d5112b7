//! Canonical serialization for signing and hashing
//!
//! Ensures a deterministic byte representation that any independent
//! implementation can reproduce. Fixed field order, big-endian integers,
//! one-byte presence markers for optional fields. JSON is never hashed.

use crate::crypto::hash_bytes;
use crate::types::{Block, Hash, TransactionRecord};

/// Canonical serializer
#[derive(Debug, Default)]
pub struct CanonicalSerializer {
    buffer: Vec<u8>,
}

impl CanonicalSerializer {
    /// Create new serializer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Write u8
    pub fn write_u8(&mut self, n: u8) {
        self.buffer.push(n);
    }

    /// Write u64 (big-endian)
    pub fn write_u64(&mut self, n: u64) {
        self.write_bytes(&n.to_be_bytes());
    }

    /// Write i64 (big-endian)
    pub fn write_i64(&mut self, n: i64) {
        self.write_bytes(&n.to_be_bytes());
    }

    /// Write optional fixed-width bytes
    pub fn write_option_bytes(&mut self, opt: Option<&[u8]>) {
        match opt {
            Some(bytes) => {
                self.write_u8(1); // Present marker
                self.write_bytes(bytes);
            }
            None => self.write_u8(0), // Absent marker
        }
    }

    /// Finalize and return bytes
    pub fn finalize(self) -> Vec<u8> {
        self.buffer
    }

    /// Compute SHA-256 hash
    pub fn hash(self) -> Hash {
        hash_bytes(&self.buffer)
    }
}

impl TransactionRecord {
    /// Bytes covered by the sender's signature: `(from, to, amount)`
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut ser = CanonicalSerializer::new();
        self.write_payload(&mut ser);
        ser.finalize()
    }

    fn write_payload(&self, ser: &mut CanonicalSerializer) {
        ser.write_option_bytes(self.from.as_ref().map(|id| id.as_bytes().as_slice()));
        ser.write_bytes(self.to.as_bytes());
        ser.write_u64(self.amount);
    }

    /// Full record encoding (payload plus signature) as committed in a block
    pub(crate) fn write_canonical(&self, ser: &mut CanonicalSerializer) {
        self.write_payload(ser);
        ser.write_option_bytes(self.signature.as_ref().map(|sig| sig.as_bytes().as_slice()));
    }
}

/// Canonical encoding of `(index, previous_hash, timestamp, transactions)`
///
/// The single source of the block hash input.
pub(crate) fn block_bytes(
    index: u64,
    previous_hash: &Hash,
    timestamp: i64,
    transactions: &[TransactionRecord],
) -> Vec<u8> {
    let mut ser = CanonicalSerializer::new();
    ser.write_u64(index);
    ser.write_bytes(previous_hash);
    ser.write_i64(timestamp);
    ser.write_u64(transactions.len() as u64);
    for tx in transactions {
        tx.write_canonical(&mut ser);
    }
    ser.finalize()
}

/// SHA-256 over [`block_bytes`]
pub(crate) fn block_hash(
    index: u64,
    previous_hash: &Hash,
    timestamp: i64,
    transactions: &[TransactionRecord],
) -> Hash {
    hash_bytes(&block_bytes(index, previous_hash, timestamp, transactions))
}

impl Block {
    /// Canonical bytes of the hashed fields
    pub fn canonical_bytes(&self) -> Vec<u8> {
        block_bytes(
            self.index(),
            self.previous_hash(),
            self.timestamp(),
            self.transactions(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Identity, Signature};

    #[test]
    fn test_payload_layout() {
        let from = Identity::from_bytes([1u8; 32]);
        let to = Identity::from_bytes([2u8; 32]);
        let tx = TransactionRecord::transfer(from, to, 30);

        let payload = tx.signing_payload();
        assert_eq!(payload.len(), 1 + 32 + 32 + 8);
        assert_eq!(payload[0], 1);
        assert_eq!(&payload[1..33], &[1u8; 32]);
        assert_eq!(&payload[33..65], &[2u8; 32]);
        assert_eq!(&payload[65..], &30u64.to_be_bytes());
    }

    #[test]
    fn test_issuance_payload_has_absent_marker() {
        let tx = TransactionRecord::issuance(Identity::from_bytes([2u8; 32]), 100);
        let payload = tx.signing_payload();
        assert_eq!(payload.len(), 1 + 32 + 8);
        assert_eq!(payload[0], 0);
    }

    #[test]
    fn test_signature_excluded_from_payload_but_hashed() {
        let from = Identity::from_bytes([1u8; 32]);
        let to = Identity::from_bytes([2u8; 32]);
        let unsigned = TransactionRecord::transfer(from, to, 5);
        let mut signed = unsigned.clone();
        signed.signature = Some(Signature::from_bytes([9u8; 64]));

        assert_eq!(unsigned.signing_payload(), signed.signing_payload());

        let prev = [0u8; 32];
        assert_ne!(
            block_hash(1, &prev, 10, &[unsigned]),
            block_hash(1, &prev, 10, &[signed])
        );
    }

    #[test]
    fn test_block_layout() {
        let tx = TransactionRecord::issuance(Identity::from_bytes([3u8; 32]), 42);
        let block = Block::new(7, 1_700_000_000_000, vec![tx.clone(), tx], [5u8; 32]);
        let bytes = block.canonical_bytes();

        assert_eq!(&bytes[..8], &7u64.to_be_bytes());
        assert_eq!(&bytes[8..40], &[5u8; 32]);
        assert_eq!(&bytes[40..48], &1_700_000_000_000i64.to_be_bytes());
        assert_eq!(&bytes[48..56], &2u64.to_be_bytes());
        // Two issuances: absent sender, recipient, amount, absent signature
        assert_eq!(bytes.len(), 56 + 2 * (1 + 32 + 8 + 1));
    }

    #[test]
    fn test_block_hash_matches_canonical_bytes() {
        let tx = TransactionRecord::issuance(Identity::from_bytes([3u8; 32]), 42);
        let block = Block::new(0, 1_700_000_000_000, vec![tx], [0u8; 32]);
        assert_eq!(block.hash(), &hash_bytes(&block.canonical_bytes()));
    }
}
