//! Output creation and an in-memory ledger.
//!
//! [`create_unspents`] is the single place where a transaction's declared
//! outputs become [`UxOut`]s with content-addressed IDs. [`MemoryLedger`]
//! holds a chain in memory and can be persisted as a bincode chain file.

use std::fs;
use std::path::Path;

use crate::error::{LedgerError, RillError};
use crate::traits::Ledger;
use crate::types::{Block, BlockHeader, Transaction, UxBody, UxHead, UxOut};

/// Derive the outputs created by `tx` when included in the block with `header`.
///
/// Deterministic: the same header and transaction always produce the same
/// outputs in declaration order.
pub fn create_unspents(header: &BlockHeader, tx: &Transaction) -> Result<Vec<UxOut>, LedgerError> {
    let txid = tx.txid()?;
    Ok(tx
        .outputs
        .iter()
        .enumerate()
        .map(|(index, output)| UxOut {
            head: UxHead {
                time: header.timestamp,
                block_seq: header.seq,
            },
            body: UxBody {
                src_txid: txid,
                index: index as u64,
                pubkey_hash: output.pubkey_hash,
                value: output.value,
            },
        })
        .collect())
}

/// In-memory ledger.
///
/// Blocks are appended with [`push_block`](Self::push_block), which only
/// checks that seqs are gapless. No consensus validation is performed.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    blocks: Vec<Block>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Build a ledger from blocks already in seq order.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        for block in blocks {
            ledger.push_block(block)?;
        }
        Ok(ledger)
    }

    /// Append a block. Its seq must equal the current block count.
    pub fn push_block(&mut self, block: Block) -> Result<(), LedgerError> {
        let expected = self.blocks.len() as u64;
        if block.seq() != expected {
            return Err(LedgerError::SeqMismatch {
                expected,
                got: block.seq(),
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the ledger has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Load a chain file written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let bytes = fs::read(path.as_ref()).map_err(|e| LedgerError::Io(e.to_string()))?;
        let (blocks, _): (Vec<Block>, _) =
            bincode::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Self::from_blocks(blocks)
    }

    /// Write the chain as a bincode-encoded `Vec<Block>`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let bytes = bincode::encode_to_vec(&self.blocks, bincode::config::standard())
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        fs::write(path.as_ref(), bytes).map_err(|e| LedgerError::Io(e.to_string()))
    }
}

impl Ledger for MemoryLedger {
    fn head_seq(&self) -> Result<Option<u64>, RillError> {
        Ok(self.blocks.last().map(Block::seq))
    }

    fn block_at_depth(&self, seq: u64) -> Result<Option<Block>, RillError> {
        Ok(usize::try_from(seq)
            .ok()
            .and_then(|i| self.blocks.get(i))
            .cloned())
    }
}
