//! Admission control for the pending pool
//!
//! Every transaction passes three gates, in order:
//!
//! 1. Identity: sender and recipient are registered, amount is positive.
//!    Client-submitted issuance is refused here.
//! 2. Funds: an amount above the committed balance is
//!    `InsufficientBalance`; one that fits the committed balance but not the
//!    *available* balance (committed minus everything the sender already has
//!    pending) is `DoubleSpendSuspected`.
//! 3. Signature: produced by the sender's own key.
//!
//! Admitted amounts stay reserved until the next mine consumes them, so two
//! spends of the same funds can never both enter the pool.

use crate::identity::IdentityRegistry;
use crate::ledger::{decode_chain, Ledger};
use crate::types::{Block, CheckedTransaction, Identity, TransactionRecord};
use crate::{Rejection, Result};
use std::collections::HashMap;

/// Gatekeeper and sole owner of the [`Ledger`]
#[derive(Debug)]
pub struct AdmissionController {
    ledger: Ledger,
    registry: IdentityRegistry,

    /// Sum of pending amounts per sender
    reservations: HashMap<Identity, u64>,
}

impl AdmissionController {
    /// Wrap a freshly initialised ledger
    ///
    /// A [`Ledger`] built outside the crate always has an empty pending pool,
    /// so there is nothing to reserve yet.
    pub fn new(ledger: Ledger, registry: IdentityRegistry) -> Self {
        Self {
            ledger,
            registry,
            reservations: HashMap::new(),
        }
    }

    /// Read-only ledger view
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Recognised identities
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Recognise another identity
    pub fn register_identity(&mut self, label: impl Into<String>, identity: Identity) -> Result<()> {
        self.registry.register(label, identity)
    }

    /// Committed balance
    pub fn balance(&self, identity: &Identity) -> i128 {
        self.ledger.balance(identity)
    }

    /// Committed balance minus pending reservations
    pub fn available_balance(&self, identity: &Identity) -> i128 {
        self.ledger.balance(identity) - i128::from(self.reserved(identity))
    }

    fn reserved(&self, identity: &Identity) -> u64 {
        self.reservations.get(identity).copied().unwrap_or(0)
    }

    /// Run every gate; nothing is mutated
    ///
    /// The signature verdict travels inside the [`CheckedTransaction`], so it
    /// may be computed ahead of time outside the serialized step.
    pub fn validate(&self, checked: &CheckedTransaction) -> std::result::Result<(), Rejection> {
        let tx = checked.record();

        // 1. Identity
        let sender = tx.from.ok_or_else(|| {
            Rejection::InvalidIdentity("issuance cannot be submitted".to_string())
        })?;
        if !self.registry.contains(&sender) {
            return Err(Rejection::InvalidIdentity(format!(
                "unknown sender {}",
                sender.short()
            )));
        }
        if !self.registry.contains(&tx.to) {
            return Err(Rejection::InvalidIdentity(format!(
                "unknown recipient {}",
                tx.to.short()
            )));
        }
        if tx.amount == 0 {
            return Err(Rejection::InvalidAmount);
        }

        // 2. Reservation-aware funds check
        let requested = i128::from(tx.amount);
        let balance = self.ledger.balance(&sender);
        let available = balance - i128::from(self.reserved(&sender));

        if requested > balance {
            return Err(Rejection::InsufficientBalance {
                sender,
                requested: tx.amount,
                balance,
            });
        }
        if requested > available {
            return Err(Rejection::DoubleSpendSuspected {
                sender,
                requested: tx.amount,
                available,
            });
        }

        // 3. Signature
        if !checked.signature_valid() {
            return Err(Rejection::InvalidSignature);
        }

        Ok(())
    }

    /// Verify the signature and admit
    pub fn submit(&mut self, tx: TransactionRecord) -> std::result::Result<(), Rejection> {
        self.admit(tx.check_signature())
    }

    /// Admit a transaction whose signature was checked ahead of time
    ///
    /// On success the record enters the pool and its amount is reserved.
    pub fn admit(&mut self, checked: CheckedTransaction) -> std::result::Result<(), Rejection> {
        if let Err(rejection) = self.validate(&checked) {
            let tx = checked.record();
            tracing::debug!(
                from = ?tx.from,
                to = %tx.to.short(),
                amount = tx.amount,
                reason = rejection.code(),
                "Transaction rejected"
            );
            return Err(rejection);
        }

        let tx = checked.into_record();

        // validate() guarantees a sender
        if let Some(sender) = tx.from {
            *self.reservations.entry(sender).or_insert(0) += tx.amount;
        }

        tracing::debug!(
            from = ?tx.from,
            to = %tx.to.short(),
            amount = tx.amount,
            pending = self.ledger.pending().len() + 1,
            "Transaction admitted"
        );

        self.ledger.push_pending(tx);
        Ok(())
    }

    /// Drain the pending pool into a new block
    ///
    /// Snapshot, build, append, clear and release reservations happen
    /// together; an empty pool changes nothing.
    pub fn mine(&mut self) -> std::result::Result<Block, Rejection> {
        if self.ledger.pending().is_empty() {
            return Err(Rejection::EmptyPendingPool);
        }

        let transactions = self.ledger.take_pending();
        let block = self.ledger.create_block_from_pending(transactions);
        self.ledger.append_block(block.clone());
        self.reservations.clear();

        tracing::info!(
            index = block.index(),
            hash = %block.hash_hex(),
            transactions = block.transactions().len(),
            "Block mined"
        );

        Ok(block)
    }

    /// Serialize the committed chain
    pub fn save_chain(&self) -> Result<Vec<u8>> {
        self.ledger.save_chain()
    }

    /// Replace the chain with verified persisted bytes
    ///
    /// On any decode or verification failure the current state is left
    /// untouched. On success the pending pool is dropped, since it was
    /// admitted against the old history.
    pub fn load_chain(&mut self, bytes: &[u8]) -> Result<()> {
        let chain = match decode_chain(bytes) {
            Ok(chain) => chain,
            Err(e) => {
                tracing::warn!(error = %e, "Refusing to load chain");
                return Err(e);
            }
        };

        let height = chain.len();
        let dropped = self.ledger.replace_chain(chain);
        self.reservations.clear();

        tracing::info!(height, dropped_pending = dropped.len(), "Chain loaded");
        Ok(())
    }
}
