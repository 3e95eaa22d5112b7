//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `coin_ledger_transactions_admitted_total` - Transactions entering the pending pool
//! - `coin_ledger_transactions_rejected_total{reason}` - Rejections by reason code
//! - `coin_ledger_blocks_mined_total` - Blocks appended by mining
//! - `coin_ledger_pending_transactions` - Current pending pool size
//! - `coin_ledger_chain_height` - Committed blocks
//! - `coin_ledger_admission_duration_seconds` - Histogram of admission latencies

use crate::Rejection;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Admitted transactions
    pub admitted_total: IntCounter,

    /// Rejections, labelled by reason
    pub rejected_total: IntCounterVec,

    /// Blocks mined
    pub blocks_mined: IntCounter,

    /// Pending pool size
    pub pending: IntGauge,

    /// Chain height
    pub chain_height: IntGauge,

    /// Admission latency
    pub admission_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("admitted_total", &self.admitted_total.get())
            .field("blocks_mined", &self.blocks_mined.get())
            .field("pending", &self.pending.get())
            .field("chain_height", &self.chain_height.get())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let admitted_total = IntCounter::new(
            "coin_ledger_transactions_admitted_total",
            "Transactions admitted to the pending pool",
        )?;
        registry.register(Box::new(admitted_total.clone()))?;

        let rejected_total = IntCounterVec::new(
            Opts::new(
                "coin_ledger_transactions_rejected_total",
                "Transactions and mine requests rejected, by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(rejected_total.clone()))?;

        let blocks_mined = IntCounter::new(
            "coin_ledger_blocks_mined_total",
            "Blocks appended by mining",
        )?;
        registry.register(Box::new(blocks_mined.clone()))?;

        let pending = IntGauge::new(
            "coin_ledger_pending_transactions",
            "Transactions waiting in the pending pool",
        )?;
        registry.register(Box::new(pending.clone()))?;

        let chain_height = IntGauge::new("coin_ledger_chain_height", "Committed blocks")?;
        registry.register(Box::new(chain_height.clone()))?;

        let admission_duration = Histogram::with_opts(
            HistogramOpts::new(
                "coin_ledger_admission_duration_seconds",
                "Histogram of admission latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
        )?;
        registry.register(Box::new(admission_duration.clone()))?;

        Ok(Self {
            admitted_total,
            rejected_total,
            blocks_mined,
            pending,
            chain_height,
            admission_duration,
            registry,
        })
    }

    /// Record an admitted transaction
    pub fn record_admitted(&self) {
        self.admitted_total.inc();
    }

    /// Record a rejection
    pub fn record_rejected(&self, rejection: &Rejection) {
        self.rejected_total
            .with_label_values(&[rejection.code()])
            .inc();
    }

    /// Record admission latency
    pub fn record_admission_duration(&self, duration_seconds: f64) {
        self.admission_duration.observe(duration_seconds);
    }

    /// Record a mined block
    pub fn record_block_mined(&self) {
        self.blocks_mined.inc();
    }

    /// Refresh pool and chain gauges
    pub fn update_ledger_gauges(&self, pending: usize, height: u64) {
        self.pending.set(pending as i64);
        self.chain_height.set(height as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.admitted_total.get(), 0);
        assert_eq!(metrics.blocks_mined.get(), 0);
    }

    #[test]
    fn test_debug_shows_current_values() {
        let metrics = Metrics::new().unwrap();
        metrics.update_ledger_gauges(3, 5);

        let rendered = format!("{:?}", metrics);
        assert!(rendered.starts_with("Metrics"));
        assert!(rendered.contains("chain_height: 5"));
    }

    #[test]
    fn test_independent_registries() {
        // Each collector owns its registry, so two can coexist
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_admitted();
        assert_eq!(a.admitted_total.get(), 1);
        assert_eq!(b.admitted_total.get(), 0);
    }

    #[test]
    fn test_record_rejected_by_reason() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected(&Rejection::InvalidSignature);
        metrics.record_rejected(&Rejection::InvalidSignature);
        metrics.record_rejected(&Rejection::EmptyPendingPool);

        let by_reason = |code: &str| metrics.rejected_total.with_label_values(&[code]).get();
        assert_eq!(by_reason("invalid_signature"), 2);
        assert_eq!(by_reason("empty_pending_pool"), 1);
    }

    #[test]
    fn test_update_ledger_gauges() {
        let metrics = Metrics::new().unwrap();
        metrics.update_ledger_gauges(3, 7);
        assert_eq!(metrics.pending.get(), 3);
        assert_eq!(metrics.chain_height.get(), 7);
    }

    #[test]
    fn test_registry_gathers_all_families() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected(&Rejection::InvalidAmount);
        let families = metrics.registry().gather();
        assert_eq!(families.len(), 6);
    }
}
