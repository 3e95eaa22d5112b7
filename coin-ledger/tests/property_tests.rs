//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Hash integrity: every stored hash equals the recomputed hash
//! - Linkage: every block points at its predecessor's hash
//! - Conservation: transfers never create or destroy value
//! - No overdraft: pending spends never exceed the committed balance
//! - Persistence: save/load reproduces the chain exactly

use coin_ledger::{
    verify_chain, AdmissionController, Block, IdentityRegistry, KeyPair, Ledger, Rejection,
    TransactionRecord, GENESIS_PREVIOUS_HASH,
};
use proptest::prelude::*;

const ACCOUNTS: usize = 4;

/// One attempted transfer: sender index, recipient index, amount, mine afterwards
#[derive(Debug, Clone)]
struct Step {
    from: usize,
    to: usize,
    amount: u64,
    mine: bool,
}

/// Strategy for generating transfer attempts
fn step_strategy() -> impl Strategy<Value = Step> {
    (0..ACCOUNTS, 0..ACCOUNTS, 1u64..150, any::<bool>()).prop_map(|(from, to, amount, mine)| {
        Step {
            from,
            to,
            amount,
            mine,
        }
    })
}

/// Strategy for generating genesis allocations
fn allocation_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..500, ACCOUNTS)
}

fn keys() -> Vec<KeyPair> {
    (0..ACCOUNTS)
        .map(|i| KeyPair::development(&format!("account-{}", i)))
        .collect()
}

fn controller(keys: &[KeyPair], allocations: &[u64]) -> AdmissionController {
    let mut registry = IdentityRegistry::new();
    for (i, key) in keys.iter().enumerate() {
        registry
            .register(format!("account-{}", i), key.identity())
            .unwrap();
    }

    let issuance: Vec<_> = keys
        .iter()
        .zip(allocations)
        .map(|(key, amount)| (key.identity(), *amount))
        .collect();

    AdmissionController::new(Ledger::genesis(&issuance).unwrap(), registry)
}

/// Apply `steps`, then mine whatever is left
fn run(keys: &[KeyPair], allocations: &[u64], steps: &[Step]) -> AdmissionController {
    let mut controller = controller(keys, allocations);
    for step in steps {
        let tx = TransactionRecord::signed_transfer(
            &keys[step.from],
            keys[step.to].identity(),
            step.amount,
        );
        let _ = controller.submit(tx);
        if step.mine {
            let _ = controller.mine();
        }
    }
    let _ = controller.mine();
    controller
}

fn assert_chain_integrity(chain: &[Block]) {
    assert_eq!(chain[0].previous_hash(), &GENESIS_PREVIOUS_HASH);
    for block in chain {
        assert_eq!(&block.recompute_hash(), block.hash());
    }
    for pair in chain.windows(2) {
        assert_eq!(pair[1].previous_hash(), pair[0].hash());
        assert!(pair[1].timestamp() >= pair[0].timestamp());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: every block's hash and linkage hold after any admission sequence
    #[test]
    fn prop_chain_integrity(
        allocations in allocation_strategy(),
        steps in prop::collection::vec(step_strategy(), 0..40),
    ) {
        let keys = keys();
        let controller = run(&keys, &allocations, &steps);

        assert_chain_integrity(controller.ledger().chain());
        prop_assert!(verify_chain(controller.ledger().chain()).is_ok());
    }

    /// Property: total supply equals total issuance; nobody goes negative
    #[test]
    fn prop_money_conservation(
        allocations in allocation_strategy(),
        steps in prop::collection::vec(step_strategy(), 0..40),
    ) {
        let keys = keys();
        let controller = run(&keys, &allocations, &steps);

        let total: i128 = keys
            .iter()
            .map(|key| controller.balance(&key.identity()))
            .sum();
        let issued: i128 = allocations.iter().map(|a| i128::from(*a)).sum();
        prop_assert_eq!(total, issued);

        for key in &keys {
            prop_assert!(controller.balance(&key.identity()) >= 0);
        }
    }

    /// Property: pending reservations never exceed any committed balance
    #[test]
    fn prop_pending_never_overdraws(
        allocations in allocation_strategy(),
        amounts in prop::collection::vec(1u64..300, 1..20),
    ) {
        let keys = keys();
        let mut controller = controller(&keys, &allocations);

        for amount in amounts {
            let tx = TransactionRecord::signed_transfer(&keys[0], keys[1].identity(), amount);
            let _ = controller.submit(tx);
        }

        let pending: u64 = controller.ledger().pending().iter().map(|tx| tx.amount).sum();
        prop_assert!(i128::from(pending) <= controller.balance(&keys[0].identity()));
        prop_assert!(controller.available_balance(&keys[0].identity()) >= 0);
    }

    /// Property: of two spends that jointly overdraw, exactly the first is admitted
    #[test]
    fn prop_first_validated_wins(
        balance in 2u64..1_000,
        split in 1u64..1_000,
    ) {
        let first = split.min(balance);
        let second = balance - first + 1;

        let keys = keys();
        let mut controller = controller(&keys, &[balance, 1, 1, 1]);

        let a = TransactionRecord::signed_transfer(&keys[0], keys[1].identity(), first);
        let b = TransactionRecord::signed_transfer(&keys[0], keys[2].identity(), second);

        prop_assert!(controller.submit(a).is_ok());
        let rejected = controller.submit(b);
        let is_double_spend = matches!(rejected, Err(Rejection::DoubleSpendSuspected { .. }));
        let is_insufficient = matches!(rejected, Err(Rejection::InsufficientBalance { .. }));
        prop_assert!(is_double_spend || is_insufficient);
        prop_assert_eq!(controller.ledger().pending().len(), 1);
    }

    /// Property: tampered signatures never reach the pool or a block
    #[test]
    fn prop_bad_signatures_never_committed(
        amount in 1u64..100,
        flip in 0usize..64,
    ) {
        let keys = keys();
        let mut controller = controller(&keys, &[100, 100, 100, 100]);

        let mut tx = TransactionRecord::signed_transfer(&keys[0], keys[1].identity(), amount);
        let mut sig = *tx.signature.as_ref().unwrap().as_bytes();
        sig[flip] ^= 0x01;
        tx.signature = Some(coin_ledger::Signature::from_bytes(sig));

        prop_assert_eq!(controller.submit(tx), Err(Rejection::InvalidSignature));
        prop_assert!(controller.ledger().pending().is_empty());
        prop_assert_eq!(controller.mine(), Err(Rejection::EmptyPendingPool));
        prop_assert_eq!(controller.ledger().height(), 1);
    }

    /// Property: save/load reproduces the chain block for block
    #[test]
    fn prop_save_load_roundtrip(
        allocations in allocation_strategy(),
        steps in prop::collection::vec(step_strategy(), 0..20),
    ) {
        let keys = keys();
        let source = run(&keys, &allocations, &steps);
        let bytes = source.save_chain().unwrap();

        let mut target = controller(&keys, &allocations);
        target.load_chain(&bytes).unwrap();

        prop_assert_eq!(target.ledger().chain(), source.ledger().chain());
        for block in target.ledger().chain() {
            prop_assert_eq!(&block.recompute_hash(), block.hash());
        }
        for key in &keys {
            prop_assert_eq!(
                target.balance(&key.identity()),
                source.balance(&key.identity())
            );
        }
    }
}
