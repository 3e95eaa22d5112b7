//! Cryptographic operations for the ledger
//!
//! This module provides:
//! - Ed25519 key pair generation, signing, and verification
//! - SHA-256 hashing for blocks
//! - Deterministic development keys derived from a label

use crate::types::{Hash, Identity, Signature};
use crate::{Error, Result};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

/// Domain prefix for development key derivation
const DEV_KEY_DOMAIN: &[u8] = b"coin-ledger/dev-key/";

/// Ed25519 key pair for signing
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Deterministic key for a development account label
    ///
    /// Anyone who knows the label can derive the secret. Only for local
    /// networks seeded from configuration.
    pub fn development(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DEV_KEY_DOMAIN);
        hasher.update(label.as_bytes());
        let seed: [u8; 32] = hasher.finalize().into();
        Self::from_seed(&seed)
    }

    /// Ledger identity (public key)
    pub fn identity(&self) -> Identity {
        Identity::from_bytes(self.verifying_key.to_bytes())
    }

    /// Get private key bytes (USE WITH CAUTION - should be protected)
    pub fn secret_key(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_bytes(self.signing_key.sign(message).to_bytes())
    }
}

/// Sign `payload` with raw secret key bytes
///
/// Fails with [`Error::Key`] unless the key is exactly 32 bytes.
pub fn sign(payload: &[u8], secret_key: &[u8]) -> Result<Signature> {
    let seed: [u8; 32] = secret_key.try_into().map_err(|_| {
        Error::Key(format!(
            "Secret key must be 32 bytes, got {}",
            secret_key.len()
        ))
    })?;
    Ok(KeyPair::from_seed(&seed).sign(payload))
}

/// Verify a signature against an identity
///
/// Returns false for a mismatch or for a public key that is not a valid
/// curve point. Never panics.
pub fn verify(payload: &[u8], public_key: &Identity, signature: &Signature) -> bool {
    let verifying_key = match VerifyingKey::from_bytes(public_key.as_bytes()) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let dalek_sig = DalekSignature::from_bytes(signature.as_bytes());
    verifying_key.verify(payload, &dalek_sig).is_ok()
}

/// Check that identity bytes decode to an Ed25519 public key
pub fn validate_public_key(identity: &Identity) -> Result<()> {
    VerifyingKey::from_bytes(identity.as_bytes())
        .map(|_| ())
        .map_err(|e| Error::Key(format!("Invalid public key {}: {}", identity.short(), e)))
}

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
