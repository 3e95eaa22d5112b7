//! Chain and pending pool
//!
//! The [`Ledger`] holds committed blocks and the admitted-but-unmined pool.
//! Balances are never stored: every query replays the full chain, so a
//! balance cannot drift from the blocks that justify it.
//!
//! Mutation is crate-private. Only [`crate::AdmissionController`] appends
//! blocks or touches the pool.
//!
//! # Example
//!
//! ```
//! use coin_ledger::{KeyPair, Ledger};
//!
//! let alice = KeyPair::development("Alice").identity();
//! let ledger = Ledger::genesis(&[(alice, 100)]).unwrap();
//!
//! assert_eq!(ledger.balance(&alice), 100);
//! assert_eq!(ledger.height(), 1);
//! ```

use crate::types::{Block, Identity, TransactionRecord, GENESIS_PREVIOUS_HASH};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;

/// Committed chain plus pending pool
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Committed blocks, genesis first
    chain: Vec<Block>,

    /// Admitted transactions awaiting the next mine
    pending: Vec<TransactionRecord>,
}

impl Ledger {
    /// Start a ledger whose genesis block issues each allocation
    pub fn genesis(allocations: &[(Identity, u64)]) -> Result<Self> {
        if let Some((identity, _)) = allocations.iter().find(|(_, amount)| *amount == 0) {
            return Err(Error::Config(format!(
                "Genesis allocation for {} must be positive",
                identity.short()
            )));
        }

        let transactions = allocations
            .iter()
            .map(|(identity, amount)| TransactionRecord::issuance(*identity, *amount))
            .collect();

        let genesis = Block::new(
            0,
            Utc::now().timestamp_millis(),
            transactions,
            GENESIS_PREVIOUS_HASH,
        );

        tracing::info!(
            hash = %genesis.hash_hex(),
            allocations = allocations.len(),
            "Genesis block created"
        );

        Ok(Self {
            chain: vec![genesis],
            pending: Vec::new(),
        })
    }

    /// Adopt an existing chain after full verification
    pub fn from_chain(chain: Vec<Block>) -> Result<Self> {
        verify_chain(&chain)?;
        Ok(Self {
            chain,
            pending: Vec::new(),
        })
    }

    /// Committed balance, replayed from genesis
    pub fn balance(&self, identity: &Identity) -> i128 {
        let mut balance: i128 = 0;
        for tx in self.chain.iter().flat_map(|block| block.transactions()) {
            if tx.from.as_ref() == Some(identity) {
                balance -= i128::from(tx.amount);
            }
            if &tx.to == identity {
                balance += i128::from(tx.amount);
            }
        }
        balance
    }

    /// Every committed transaction in chain order
    pub fn transaction_history(&self) -> Vec<TransactionRecord> {
        self.chain
            .iter()
            .flat_map(|block| block.transactions().iter().cloned())
            .collect()
    }

    /// Build the next block over `transactions` without appending it
    pub fn create_block_from_pending(&self, transactions: Vec<TransactionRecord>) -> Block {
        let now = Utc::now().timestamp_millis();
        let (previous_hash, timestamp) = match self.chain.last() {
            Some(last) => (*last.hash(), now.max(last.timestamp())),
            None => (GENESIS_PREVIOUS_HASH, now),
        };

        Block::new(self.chain.len() as u64, timestamp, transactions, previous_hash)
    }

    /// Committed blocks
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Pending pool
    pub fn pending(&self) -> &[TransactionRecord] {
        &self.pending
    }

    /// Tip of the chain
    pub fn latest_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Number of committed blocks
    pub fn height(&self) -> u64 {
        self.chain.len() as u64
    }

    /// Serialize the committed chain
    pub fn save_chain(&self) -> Result<Vec<u8>> {
        encode_chain(&self.chain)
    }

    pub(crate) fn append_block(&mut self, block: Block) {
        debug_assert_eq!(block.index(), self.height());
        self.chain.push(block);
    }

    pub(crate) fn push_pending(&mut self, tx: TransactionRecord) {
        self.pending.push(tx);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<TransactionRecord> {
        std::mem::take(&mut self.pending)
    }

    /// Swap in a verified chain; returns the discarded pending pool
    pub(crate) fn replace_chain(&mut self, chain: Vec<Block>) -> Vec<TransactionRecord> {
        self.chain = chain;
        self.take_pending()
    }
}

/// Check every structural and accounting invariant of `chain`
///
/// Fails on the first block that breaks:
/// - stored hash vs. recomputed hash
/// - index sequence and `previous_hash` linkage (genesis uses the sentinel)
/// - non-decreasing timestamps
/// - issuance outside genesis, zero amounts, missing or bad signatures
/// - any balance dropping below zero during replay
pub fn verify_chain(chain: &[Block]) -> Result<()> {
    if chain.is_empty() {
        return Err(Error::corrupt(0, "chain has no genesis block"));
    }

    let mut balances: HashMap<Identity, i128> = HashMap::new();
    let mut previous: Option<&Block> = None;

    for (position, block) in chain.iter().enumerate() {
        let index = block.index();

        if index != position as u64 {
            return Err(Error::corrupt(
                index,
                format!("expected index {}", position),
            ));
        }

        if !block.is_intact() {
            return Err(Error::corrupt(index, "stored hash does not match contents"));
        }

        match previous {
            None => {
                if block.previous_hash() != &GENESIS_PREVIOUS_HASH {
                    return Err(Error::corrupt(index, "genesis does not use the sentinel hash"));
                }
            }
            Some(prev) => {
                if block.previous_hash() != prev.hash() {
                    return Err(Error::corrupt(index, "previous hash does not link to predecessor"));
                }
                if block.timestamp() < prev.timestamp() {
                    return Err(Error::corrupt(index, "timestamp precedes predecessor"));
                }
            }
        }

        for tx in block.transactions() {
            if tx.amount == 0 {
                return Err(Error::corrupt(index, "zero-amount transaction"));
            }

            match tx.from {
                None if index != 0 => {
                    return Err(Error::corrupt(index, "issuance outside genesis"));
                }
                None => {}
                Some(from) => {
                    if !tx.verify_signature() {
                        return Err(Error::corrupt(
                            index,
                            format!("invalid signature from {}", from.short()),
                        ));
                    }
                    let balance = balances.entry(from).or_insert(0);
                    *balance -= i128::from(tx.amount);
                    if *balance < 0 {
                        return Err(Error::corrupt(
                            index,
                            format!("{} overdrawn", from.short()),
                        ));
                    }
                }
            }

            *balances.entry(tx.to).or_insert(0) += i128::from(tx.amount);
        }

        previous = Some(block);
    }

    Ok(())
}

/// JSON array of blocks in chain order
pub fn encode_chain(chain: &[Block]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(chain)?)
}

/// Parse and verify persisted chain bytes
pub fn decode_chain(bytes: &[u8]) -> Result<Vec<Block>> {
    let chain: Vec<Block> = serde_json::from_slice(bytes)?;
    verify_chain(&chain)?;
    Ok(chain)
}
