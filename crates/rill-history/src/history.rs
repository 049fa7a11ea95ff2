//! History engine: replays the ledger into the four history indexes.
//!
//! Blocks are applied strictly in seq order. Each transaction runs through
//! a fixed pipeline:
//!
//! 1. record the transaction in the [`TransactionIndex`]
//! 2. settle its inputs: mark each consumed output spent and add it to the
//!    spender's [`AddressIndex::spent`] list (skipped for genesis)
//! 3. create its outputs in the [`OutputIndex`] and add each to the
//!    receiver's [`AddressIndex::received`] list
//!
//! A later block can only spend outputs that step 3 of an earlier block
//! wrote. An input with no output record means the ledger and the index
//! disagree; replay stops with [`HistoryError::MissingUxOut`] and nothing
//! already written is rolled back.

use std::sync::Arc;

use rill_core::error::{HistoryError, LedgerError, RillError};
use rill_core::ledger::create_unspents;
use rill_core::traits::Ledger;
use rill_core::types::{Block, BlockHeader, Hash256, Transaction};

use crate::address::AddressIndex;
use crate::kv::KvStore;
use crate::outputs::{HistoryUxOut, OutputIndex, SpendMarker};
use crate::transactions::{HistoryTransaction, TransactionIndex};

const BUCKET_META: &str = "meta";

const META_INDEXED_HEAD: &[u8] = b"indexed_head";

/// Transaction, output, and address history over one store.
///
/// Owns all four indexes; nothing else writes to them.
pub struct HistoryDb<S> {
    store: Arc<S>,
    txns: TransactionIndex<S>,
    outputs: OutputIndex<S>,
    addr_in: AddressIndex<S>,
    addr_out: AddressIndex<S>,
}

impl<S: KvStore> HistoryDb<S> {
    /// Open the indexes on `store`, creating their buckets if needed.
    pub fn new(store: Arc<S>) -> Result<Self, RillError> {
        store.open_bucket(BUCKET_META)?;
        Ok(Self {
            txns: TransactionIndex::open(Arc::clone(&store))?,
            outputs: OutputIndex::open(Arc::clone(&store))?,
            addr_in: AddressIndex::received(Arc::clone(&store))?,
            addr_out: AddressIndex::spent(Arc::clone(&store))?,
            store,
        })
    }

    /// Replay every block from genesis to the ledger head.
    ///
    /// Stops at the first error. Blocks before the failing one stay indexed.
    /// Returns the number of blocks processed.
    pub fn process_blockchain<L: Ledger + ?Sized>(&mut self, ledger: &L) -> Result<u64, RillError> {
        let Some(head) = ledger.head_seq()? else {
            tracing::info!("ledger is empty, nothing to index");
            return Ok(0);
        };
        tracing::info!(head, "replaying ledger into history index");
        let processed = self.replay_range(ledger, 0, head)?;
        tracing::info!(blocks = processed, head, "history replay complete");
        Ok(processed)
    }

    /// Replay only the blocks after [`indexed_head`](Self::indexed_head).
    ///
    /// On a fresh store this is the same as a full replay.
    /// Returns the number of blocks processed.
    pub fn sync<L: Ledger + ?Sized>(&mut self, ledger: &L) -> Result<u64, RillError> {
        let indexed = self.indexed_head()?;
        let Some(head) = ledger.head_seq()? else {
            return match indexed {
                Some(indexed_head) => Err(HistoryError::EmptyLedger { indexed_head }.into()),
                None => Ok(0),
            };
        };

        let start = match indexed {
            Some(indexed_head) if indexed_head > head => {
                return Err(HistoryError::LedgerBehind { ledger_head: head, indexed_head }.into());
            }
            Some(indexed_head) if indexed_head == head => {
                tracing::debug!(head, "history index up to date");
                return Ok(0);
            }
            Some(indexed_head) => indexed_head + 1,
            None => 0,
        };

        tracing::info!(from = start, head, "catching up history index");
        self.replay_range(ledger, start, head)
    }

    fn replay_range<L: Ledger + ?Sized>(&mut self, ledger: &L, from: u64, head: u64) -> Result<u64, RillError> {
        let mut processed = 0;
        for seq in from..=head {
            let block = ledger
                .block_at_depth(seq)?
                .ok_or(LedgerError::MissingBlock(seq))?;
            if let Err(e) = self.process_block(&block) {
                tracing::error!(seq, error = %e, "history replay stopped");
                return Err(e);
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Index one block's transactions, in ledger order.
    ///
    /// The block's seq must be at most one past [`indexed_head`](Self::indexed_head),
    /// otherwise [`HistoryError::SeqGap`] is returned before anything is
    /// written. Re-applying an already indexed block leaves the head where it is.
    pub fn process_block(&mut self, block: &Block) -> Result<(), RillError> {
        let seq = block.seq();
        let next = self.indexed_head()?.map_or(0, |head| head + 1);
        if seq > next {
            return Err(HistoryError::SeqGap { expected: next, got: seq }.into());
        }

        for tx in &block.transactions {
            let txid = tx.txid()?;
            self.record_transaction(tx, seq)?;
            // Genesis transactions reference no prior outputs.
            if !block.is_genesis() {
                self.settle_inputs(tx, txid, seq)?;
            }
            self.create_outputs(&block.header, tx)?;
        }
        if seq == next {
            self.store
                .put(BUCKET_META, META_INDEXED_HEAD, &seq.to_le_bytes())?;
        }
        tracing::debug!(seq, txs = block.transactions.len(), "indexed block");
        Ok(())
    }

    fn record_transaction(&self, tx: &Transaction, block_seq: u64) -> Result<(), RillError> {
        self.txns.put(&HistoryTransaction {
            tx: tx.clone(),
            block_seq,
        })
    }

    fn settle_inputs(&self, tx: &Transaction, txid: Hash256, block_seq: u64) -> Result<(), RillError> {
        let marker = SpendMarker { block_seq, txid };
        for uxid in &tx.inputs {
            let mut record = self
                .outputs
                .get(uxid)?
                .ok_or_else(|| HistoryError::MissingUxOut(uxid.to_string()))?;

            match record.spent {
                // Same spender seen again on a repeated replay.
                Some(existing) if existing == marker => {}
                Some(existing) => {
                    return Err(HistoryError::AlreadySpent {
                        uxid: uxid.to_string(),
                        spent_block_seq: existing.block_seq,
                        spent_txid: existing.txid.to_string(),
                    }
                    .into());
                }
                None => {
                    record.spent = Some(marker);
                    self.outputs.put(&record)?;
                }
            }

            self.addr_out.add(record.pubkey_hash(), *uxid)?;
        }
        Ok(())
    }

    fn create_outputs(&self, header: &BlockHeader, tx: &Transaction) -> Result<(), RillError> {
        for ux in create_unspents(header, tx)? {
            let uxid = ux.hash();
            let owner = *ux.pubkey_hash();
            // An existing record may already carry its spend marker.
            if !self.outputs.contains(&uxid)? {
                self.outputs.put(&HistoryUxOut::unspent(ux))?;
            }
            self.addr_in.add(&owner, uxid)?;
        }
        Ok(())
    }

    /// Look up a transaction by ID.
    pub fn get_transaction(&self, txid: &Hash256) -> Result<Option<HistoryTransaction>, RillError> {
        self.txns.get(txid)
    }

    /// Look up an output by ID.
    pub fn get_uxout(&self, uxid: &Hash256) -> Result<Option<HistoryUxOut>, RillError> {
        self.outputs.get(uxid)
    }

    /// IDs of every output the address has received.
    pub fn get_address_in(&self, pubkey_hash: &Hash256) -> Result<Vec<Hash256>, RillError> {
        self.addr_in.list(pubkey_hash)
    }

    /// IDs of every output the address has spent.
    pub fn get_address_out(&self, pubkey_hash: &Hash256) -> Result<Vec<Hash256>, RillError> {
        self.addr_out.list(pubkey_hash)
    }

    /// Every output the address has received, spent or not, in receive order.
    pub fn get_address_uxouts(&self, pubkey_hash: &Hash256) -> Result<Vec<HistoryUxOut>, RillError> {
        self.addr_in
            .list(pubkey_hash)?
            .iter()
            .map(|uxid| -> Result<HistoryUxOut, RillError> {
                self.outputs
                    .get(uxid)?
                    .ok_or_else(|| HistoryError::MissingUxOut(uxid.to_string()).into())
            })
            .collect()
    }

    /// Seq of the last block indexed. `None` on a fresh store.
    pub fn indexed_head(&self) -> Result<Option<u64>, RillError> {
        self.store
            .get(BUCKET_META, META_INDEXED_HEAD)?
            .map(|bytes| -> Result<u64, RillError> {
                let bytes: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| RillError::Storage("invalid indexed_head length".into()))?;
                Ok(u64::from_le_bytes(bytes))
            })
            .transpose()
    }
}
