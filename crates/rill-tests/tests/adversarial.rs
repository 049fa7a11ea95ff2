//! Adversarial tests for the history index.
//!
//! These feed the indexer ledgers that disagree with themselves or with the
//! index, and randomized spend chains checked against a simple model.
//!
//! Attack vectors tested:
//! - Inputs referencing outputs that were never created
//! - Forward references within a block
//! - Double spends across blocks and within one block
//! - Garbage inputs in the genesis block
//! - Randomized spend chains: spend-once and address separation

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use rill_core::error::{HistoryError, RillError};
use rill_core::types::Hash256;
use rill_tests::helpers::*;

// ---------------------------------------------------------------------------
// Test 1: input with no output record
//
// A non-genesis transaction spends an ID the index never saw. Replay must
// stop at that block; earlier blocks stay indexed.
// ---------------------------------------------------------------------------

#[test]
fn unknown_input_halts_replay() {
    let mut chain = ChainBuilder::new();
    let g = chain.push(vec![make_tx(vec![], vec![(10, pkh(1))])]);
    let o = uxids(&g, 0)[0];
    chain.push(vec![make_tx(vec![o], vec![(10, pkh(2))])]);
    let bad = chain.push(vec![make_tx(vec![Hash256([0xEE; 32])], vec![(10, pkh(3))])]);
    chain.push(vec![make_tx(vec![], vec![(10, pkh(4))])]);

    let mut db = memory_db();
    let err = db.process_blockchain(chain.ledger()).unwrap_err();
    assert!(matches!(err, RillError::History(HistoryError::MissingUxOut(_))));
    assert_eq!(db.indexed_head().unwrap(), Some(1));

    // The failing transaction was recorded before its inputs were checked,
    // but none of its outputs exist.
    let bad_txid = bad.transactions[0].txid().unwrap();
    assert!(db.get_transaction(&bad_txid).unwrap().is_some());
    assert!(db.get_uxout(&uxids(&bad, 0)[0]).unwrap().is_none());
    assert!(db.get_address_in(&pkh(3)).unwrap().is_empty());
    assert!(db.get_address_in(&pkh(4)).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test 2: forward reference inside a block
//
// The first transaction spends an output that only the second creates.
// Transactions apply in order, so the output does not exist yet.
// ---------------------------------------------------------------------------

#[test]
fn forward_reference_in_block_is_missing() {
    let mut chain = ChainBuilder::new();
    let g = chain.push(vec![make_tx(vec![], vec![(10, pkh(1))])]);
    let o = uxids(&g, 0)[0];

    let producer = make_tx(vec![o], vec![(10, pkh(2))]);
    let produced = uxids(&make_block(1, g.header.hash(), vec![producer.clone()]), 0)[0];
    let consumer = make_tx(vec![produced], vec![(10, pkh(3))]);
    chain.push(vec![consumer, producer]);

    let mut db = memory_db();
    let err = db.process_blockchain(chain.ledger()).unwrap_err();
    assert!(matches!(err, RillError::History(HistoryError::MissingUxOut(_))));
    assert!(!db.get_uxout(&o).unwrap().unwrap().is_spent());
}

// ---------------------------------------------------------------------------
// Test 3: double spend across blocks
// ---------------------------------------------------------------------------

#[test]
fn double_spend_across_blocks_rejected() {
    let mut chain = ChainBuilder::new();
    let g = chain.push(vec![make_tx(vec![], vec![(10, pkh(1))])]);
    let o = uxids(&g, 0)[0];
    let first = chain.push(vec![make_tx(vec![o], vec![(10, pkh(2))])]);
    chain.push(vec![make_tx(vec![o], vec![(10, pkh(3))])]);

    let (mut db, _dir) = rocks_db();
    let err = db.process_blockchain(chain.ledger()).unwrap_err();
    match err {
        RillError::History(HistoryError::AlreadySpent { spent_block_seq, spent_txid, .. }) => {
            assert_eq!(spent_block_seq, 1);
            assert_eq!(spent_txid, first.transactions[0].txid().unwrap().to_string());
        }
        other => panic!("expected AlreadySpent, got {other:?}"),
    }

    // The original spend is untouched.
    let marker = db.get_uxout(&o).unwrap().unwrap().spent.unwrap();
    assert_eq!(marker.block_seq, 1);
    assert_eq!(db.get_address_out(&pkh(1)).unwrap(), vec![o]);
    assert_eq!(db.indexed_head().unwrap(), Some(1));
}

// ---------------------------------------------------------------------------
// Test 4: double spend within one block
// ---------------------------------------------------------------------------

#[test]
fn double_spend_within_block_rejected() {
    let mut chain = ChainBuilder::new();
    let g = chain.push(vec![make_tx(vec![], vec![(10, pkh(1))])]);
    let o = uxids(&g, 0)[0];
    chain.push(vec![
        make_tx(vec![o], vec![(10, pkh(2))]),
        make_tx(vec![o], vec![(10, pkh(3))]),
    ]);

    let mut db = memory_db();
    let err = db.process_blockchain(chain.ledger()).unwrap_err();
    assert!(matches!(
        err,
        RillError::History(HistoryError::AlreadySpent { spent_block_seq: 1, .. })
    ));
    assert_eq!(db.indexed_head().unwrap(), Some(0));
}

// ---------------------------------------------------------------------------
// Test 5: garbage inputs in genesis
//
// Genesis inputs are never settled, whatever they reference.
// ---------------------------------------------------------------------------

#[test]
fn genesis_inputs_are_ignored() {
    let mut chain = ChainBuilder::new();
    let g = chain.push(vec![make_tx(
        vec![Hash256([0x01; 32]), Hash256([0x02; 32])],
        vec![(10, pkh(1))],
    )]);

    let mut db = memory_db();
    assert_eq!(db.process_blockchain(chain.ledger()).unwrap(), 1);
    assert!(db.get_uxout(&Hash256([0x01; 32])).unwrap().is_none());
    assert_eq!(db.get_address_in(&pkh(1)).unwrap(), uxids(&g, 0));
    assert!(db.get_address_out(&pkh(1)).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test 6: randomized spend chains
//
// Each block after genesis holds one transaction that spends a random
// subset of the unspent outputs and creates new outputs for up to four
// addresses. A model tracks who received and spent what; the index must
// agree with it exactly.
// ---------------------------------------------------------------------------

/// One generated block: which unspent outputs to pick (bit i of `mask`
/// selects the i-th unspent output) and the owners of the new outputs.
#[derive(Debug, Clone)]
struct BlockPlan {
    mask: u64,
    owners: Vec<u8>,
}

fn block_plan() -> impl Strategy<Value = BlockPlan> {
    (any::<u64>(), proptest::collection::vec(0u8..4, 1..4))
        .prop_map(|(mask, owners)| BlockPlan { mask, owners })
}

#[derive(Default)]
struct Model {
    unspent: Vec<Hash256>,
    owner: HashMap<Hash256, Hash256>,
    spent_by: HashMap<Hash256, (u64, Hash256)>,
    received: HashMap<Hash256, Vec<Hash256>>,
    spent: HashMap<Hash256, Vec<Hash256>>,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_spend_chains_match_model(
        genesis_owners in proptest::collection::vec(0u8..4, 1..6),
        plans in proptest::collection::vec(block_plan(), 0..16),
    ) {
        let mut chain = ChainBuilder::new();
        let mut model = Model::default();

        let outputs: Vec<(u64, Hash256)> = genesis_owners.iter().map(|o| (100, pkh(*o))).collect();
        let g = chain.push(vec![make_tx(vec![], outputs.clone())]);
        for (uxid, (_, owner)) in uxids(&g, 0).into_iter().zip(outputs) {
            model.unspent.push(uxid);
            model.owner.insert(uxid, owner);
            model.received.entry(owner).or_default().push(uxid);
        }

        for (i, plan) in plans.iter().enumerate() {
            let seq = i as u64 + 1;
            let inputs: Vec<Hash256> = model
                .unspent
                .iter()
                .enumerate()
                .filter(|(idx, _)| plan.mask & (1u64 << (idx % 64)) != 0)
                .map(|(_, uxid)| *uxid)
                .collect();
            let outputs: Vec<(u64, Hash256)> = plan.owners.iter().map(|o| (1, pkh(*o))).collect();
            let mut tx = make_tx(inputs.clone(), outputs.clone());
            // Keeps txids distinct when a block spends nothing.
            tx.lock_time = seq;
            let txid = tx.txid().unwrap();

            let block = chain.push(vec![tx]);
            for uxid in &inputs {
                model.spent_by.insert(*uxid, (seq, txid));
                model.spent.entry(model.owner[uxid]).or_default().push(*uxid);
            }
            model.unspent.retain(|u| !inputs.contains(u));
            for (uxid, (_, owner)) in uxids(&block, 0).into_iter().zip(outputs) {
                model.unspent.push(uxid);
                model.owner.insert(uxid, owner);
                model.received.entry(owner).or_default().push(uxid);
            }
        }

        let mut db = memory_db();
        prop_assert_eq!(db.process_blockchain(chain.ledger()).unwrap(), plans.len() as u64 + 1);
        // A second full replay must not change anything.
        db.process_blockchain(chain.ledger()).unwrap();

        for (uxid, owner) in &model.owner {
            let rec = db.get_uxout(uxid).unwrap().unwrap();
            prop_assert_eq!(rec.pubkey_hash(), owner);
            let spent = rec.spent.map(|m| (m.block_seq, m.txid));
            prop_assert_eq!(spent, model.spent_by.get(uxid).copied());
        }

        for seed in 0u8..4 {
            let addr = pkh(seed);
            let received = db.get_address_in(&addr).unwrap();
            let spent = db.get_address_out(&addr).unwrap();
            let expected_in = model.received.get(&addr).cloned().unwrap_or_default();
            let expected_out = model.spent.get(&addr).cloned().unwrap_or_default();
            prop_assert_eq!(&received, &expected_in);
            prop_assert_eq!(&spent, &expected_out);

            // Spend-once: no ID appears twice in a spent list.
            let unique: HashSet<&Hash256> = spent.iter().collect();
            prop_assert_eq!(unique.len(), spent.len());
            // Every spent ID was received by the same address first.
            for uxid in &spent {
                prop_assert!(received.contains(uxid));
            }
        }
    }
}
