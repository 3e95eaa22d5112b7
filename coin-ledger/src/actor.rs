//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`AdmissionController`], so admission and mining
//!   never interleave
//! - Signature verification runs on the caller's task; only its verdict
//!   enters the serialized step
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            Boundary layer (node, tests)               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ verify signature, then send
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │ AdmissionController                            │  │
//! │  │   validate → reserve → pending pool           │  │
//! │  │   mine: snapshot → block → append → clear     │  │
//! │  └────────────────────────────────────────────────┘  │
//! │  Optional timer: auto-mine non-empty pool             │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::admission::AdmissionController;
use crate::ledger::Ledger;
use crate::metrics::Metrics;
use crate::types::{Block, CheckedTransaction, Identity, TransactionRecord};
use crate::{Config, Error, Rejection, Result};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Admit a transaction whose signature was already checked
    SubmitTransaction {
        /// Record plus its signature verdict
        checked: CheckedTransaction,
        /// Admission outcome
        response: oneshot::Sender<std::result::Result<(), Rejection>>,
    },

    /// Drain the pending pool into a block
    Mine {
        /// Mined block or `EmptyPendingPool`
        response: oneshot::Sender<std::result::Result<Block, Rejection>>,
    },

    /// Committed balance
    Balance {
        /// Account to query
        identity: Identity,
        /// Replayed balance
        response: oneshot::Sender<i128>,
    },

    /// Committed balance minus reservations
    AvailableBalance {
        /// Account to query
        identity: Identity,
        /// Balance left for new spends
        response: oneshot::Sender<i128>,
    },

    /// Flattened committed history
    TransactionHistory {
        /// Every committed transaction in chain order
        response: oneshot::Sender<Vec<TransactionRecord>>,
    },

    /// Copy of the chain
    Chain {
        /// Committed blocks
        response: oneshot::Sender<Vec<Block>>,
    },

    /// Copy of the pending pool
    Pending {
        /// Admitted, unmined transactions
        response: oneshot::Sender<Vec<TransactionRecord>>,
    },

    /// Tip of the chain
    LatestBlock {
        /// Last committed block
        response: oneshot::Sender<Option<Block>>,
    },

    /// Serialize the chain
    SaveChain {
        /// Encoded chain
        response: oneshot::Sender<Result<Vec<u8>>>,
    },

    /// Replace the chain with verified bytes
    LoadChain {
        /// Persisted chain
        bytes: Vec<u8>,
        /// Verification outcome
        response: oneshot::Sender<Result<()>>,
    },

    /// Stop the actor
    Shutdown {
        /// Acknowledged once the loop exits
        response: oneshot::Sender<()>,
    },
}

/// Actor tuning
#[derive(Debug, Clone)]
pub struct ActorOptions {
    /// Mailbox capacity
    pub mailbox_capacity: usize,

    /// Auto-mine period (None = mine only on request)
    pub auto_mine_interval: Option<Duration>,
}

impl Default for ActorOptions {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
            auto_mine_interval: None,
        }
    }
}

impl From<&Config> for ActorOptions {
    fn from(config: &Config) -> Self {
        Self {
            mailbox_capacity: config.mailbox_capacity,
            auto_mine_interval: config
                .auto_mine
                .enabled
                .then(|| Duration::from_millis(config.auto_mine.interval_ms)),
        }
    }
}

/// Actor that processes ledger messages
#[derive(Debug)]
pub struct LedgerActor {
    /// Sole owner of the ledger
    controller: AdmissionController,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Metrics sink
    metrics: Metrics,

    /// Auto-mine period
    auto_mine_interval: Option<Duration>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        controller: AdmissionController,
        mailbox: mpsc::Receiver<LedgerMessage>,
        metrics: Metrics,
        auto_mine_interval: Option<Duration>,
    ) -> Self {
        metrics.update_ledger_gauges(
            controller.ledger().pending().len(),
            controller.ledger().height(),
        );

        Self {
            controller,
            mailbox,
            metrics,
            auto_mine_interval,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let auto_mine = self.auto_mine_interval.is_some();
        let mut mine_timer = interval(self.auto_mine_interval.unwrap_or(Duration::from_secs(3600)));
        mine_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Process incoming messages
                Some(msg) = self.mailbox.recv() => {
                    if let LedgerMessage::Shutdown { response } = msg {
                        tracing::info!(
                            height = self.controller.ledger().height(),
                            pending = self.controller.ledger().pending().len(),
                            "Ledger actor stopping"
                        );
                        let _ = response.send(());
                        break;
                    }
                    self.handle_message(msg);
                }

                // Auto-mine tick
                _ = mine_timer.tick(), if auto_mine && !self.controller.ledger().pending().is_empty() => {
                    let _ = self.mine();
                }

                // Mailbox closed
                else => break,
            }
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::SubmitTransaction { checked, response } => {
                let started = Instant::now();
                let result = self.controller.admit(checked);
                self.metrics
                    .record_admission_duration(started.elapsed().as_secs_f64());

                match &result {
                    Ok(()) => self.metrics.record_admitted(),
                    Err(rejection) => self.metrics.record_rejected(rejection),
                }
                self.refresh_gauges();
                let _ = response.send(result);
            }

            LedgerMessage::Mine { response } => {
                let result = self.mine();
                let _ = response.send(result);
            }

            LedgerMessage::Balance { identity, response } => {
                let _ = response.send(self.controller.balance(&identity));
            }

            LedgerMessage::AvailableBalance { identity, response } => {
                let _ = response.send(self.controller.available_balance(&identity));
            }

            LedgerMessage::TransactionHistory { response } => {
                let _ = response.send(self.controller.ledger().transaction_history());
            }

            LedgerMessage::Chain { response } => {
                let _ = response.send(self.controller.ledger().chain().to_vec());
            }

            LedgerMessage::Pending { response } => {
                let _ = response.send(self.controller.ledger().pending().to_vec());
            }

            LedgerMessage::LatestBlock { response } => {
                let _ = response.send(self.controller.ledger().latest_block().cloned());
            }

            LedgerMessage::SaveChain { response } => {
                let _ = response.send(self.controller.save_chain());
            }

            LedgerMessage::LoadChain { bytes, response } => {
                let result = self.controller.load_chain(&bytes);
                self.refresh_gauges();
                let _ = response.send(result);
            }

            LedgerMessage::Shutdown { .. } => {
                // Handled in main loop
            }
        }
    }

    fn mine(&mut self) -> std::result::Result<Block, Rejection> {
        let result = self.controller.mine();
        match &result {
            Ok(_) => self.metrics.record_block_mined(),
            Err(rejection) => self.metrics.record_rejected(rejection),
        }
        self.refresh_gauges();
        result
    }

    fn refresh_gauges(&self) {
        let ledger = self.controller.ledger();
        self.metrics
            .update_ledger_gauges(ledger.pending().len(), ledger.height());
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Submit a signed transaction
    ///
    /// The signature is checked here, before the message is queued.
    pub async fn submit_transaction(&self, tx: TransactionRecord) -> Result<()> {
        let checked = tx.check_signature();
        self.request(|response| LedgerMessage::SubmitTransaction { checked, response })
        .await?
        .map_err(Error::from)
    }

    /// Mine the pending pool
    pub async fn mine(&self) -> Result<Block> {
        self.request(|response| LedgerMessage::Mine { response })
            .await?
            .map_err(Error::from)
    }

    /// Committed balance
    pub async fn balance(&self, identity: Identity) -> Result<i128> {
        self.request(|response| LedgerMessage::Balance { identity, response })
            .await
    }

    /// Committed balance minus pending reservations
    pub async fn available_balance(&self, identity: Identity) -> Result<i128> {
        self.request(|response| LedgerMessage::AvailableBalance { identity, response })
            .await
    }

    /// Every committed transaction in order
    pub async fn transaction_history(&self) -> Result<Vec<TransactionRecord>> {
        self.request(|response| LedgerMessage::TransactionHistory { response })
            .await
    }

    /// Copy of the chain
    pub async fn chain(&self) -> Result<Vec<Block>> {
        self.request(|response| LedgerMessage::Chain { response })
            .await
    }

    /// Copy of the pending pool
    pub async fn pending(&self) -> Result<Vec<TransactionRecord>> {
        self.request(|response| LedgerMessage::Pending { response })
            .await
    }

    /// Tip of the chain
    pub async fn latest_block(&self) -> Result<Option<Block>> {
        self.request(|response| LedgerMessage::LatestBlock { response })
            .await
    }

    /// Serialize the chain
    pub async fn save_chain(&self) -> Result<Vec<u8>> {
        self.request(|response| LedgerMessage::SaveChain { response })
            .await?
    }

    /// Replace the chain with verified bytes
    pub async fn load_chain(&self, bytes: Vec<u8>) -> Result<()> {
        self.request(|response| LedgerMessage::LoadChain { bytes, response })
            .await?
    }

    /// Stop the actor and wait for it to acknowledge
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|response| LedgerMessage::Shutdown { response })
            .await
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    controller: AdmissionController,
    metrics: Metrics,
    options: ActorOptions,
) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(options.mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor::new(controller, rx, metrics, options.auto_mine_interval);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}

/// Build genesis from configuration and spawn the actor
///
/// Must be called inside a Tokio runtime.
pub fn open(config: &Config, metrics: Metrics) -> Result<LedgerHandle> {
    config.validate()?;

    let (registry, issuance) = config.genesis.resolve()?;
    let ledger = Ledger::genesis(&issuance)?;
    let controller = AdmissionController::new(ledger, registry);

    for (label, identity) in controller.registry().iter() {
        tracing::debug!(%label, identity = %identity.short(), "Recognised identity");
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        identities = controller.registry().len(),
        "Ledger opened"
    );

    Ok(spawn_ledger_actor(
        controller,
        metrics,
        ActorOptions::from(config),
    ))
}
