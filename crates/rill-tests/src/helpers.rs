//! Shared test helpers for E2E and adversarial tests.

use std::sync::Arc;

use rill_core::ledger::{create_unspents, MemoryLedger};
use rill_core::types::*;
use rill_history_lib::{HistoryDb, MemoryStore, RocksStore};

/// Simple pubkey hash from a seed byte.
pub fn pkh(seed: u8) -> Hash256 {
    Hash256([seed; 32])
}

/// Create a transaction spending `inputs` into `(value, owner)` outputs.
pub fn make_tx(inputs: Vec<Hash256>, outputs: Vec<(u64, Hash256)>) -> Transaction {
    Transaction {
        version: 1,
        inputs,
        outputs: outputs
            .into_iter()
            .map(|(value, pubkey_hash)| TxOutput { value, pubkey_hash })
            .collect(),
        lock_time: 0,
    }
}

/// Create a block with a correct body hash.
pub fn make_block(seq: u64, prev_hash: Hash256, txs: Vec<Transaction>) -> Block {
    Block {
        header: BlockHeader {
            version: 1,
            seq,
            prev_hash,
            body_hash: Block::body_hash(&txs).unwrap(),
            timestamp: 1_700_000_000 + seq * 60,
        },
        transactions: txs,
    }
}

/// Output IDs created by transaction `tx_index` of `block`, in output order.
pub fn uxids(block: &Block, tx_index: usize) -> Vec<Hash256> {
    create_unspents(&block.header, &block.transactions[tx_index])
        .unwrap()
        .iter()
        .map(|ux| ux.hash())
        .collect()
}

/// Builds a linked chain one block at a time.
#[derive(Default)]
pub struct ChainBuilder {
    ledger: MemoryLedger,
    prev_hash: Hash256,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block holding `txs` and return a copy of it.
    pub fn push(&mut self, txs: Vec<Transaction>) -> Block {
        let block = make_block(self.ledger.len() as u64, self.prev_hash, txs);
        self.prev_hash = block.header.hash();
        self.ledger.push_block(block.clone()).unwrap();
        block
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> MemoryLedger {
        self.ledger
    }
}

/// Fresh in-memory history database.
pub fn memory_db() -> HistoryDb<MemoryStore> {
    HistoryDb::new(Arc::new(MemoryStore::new())).unwrap()
}

/// Fresh RocksDB history database in a temp directory.
///
/// The directory must outlive the database.
pub fn rocks_db() -> (HistoryDb<RocksStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksStore::open(dir.path().join("history")).unwrap());
    (HistoryDb::new(store).unwrap(), dir)
}
