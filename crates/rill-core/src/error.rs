//! Error types for the Rill ledger and history index.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("block missing at seq {0}")] MissingBlock(u64),
    #[error("seq mismatch: expected {expected}, got {got}")] SeqMismatch { expected: u64, got: u64 },
    #[error("invalid hash: {0}")] InvalidHash(String),
    #[error("serialization: {0}")] Serialization(String),
    #[error("io: {0}")] Io(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("output not indexed: {0}")] MissingUxOut(String),
    #[error("output {uxid} already spent at seq {spent_block_seq} by {spent_txid}")] AlreadySpent { uxid: String, spent_block_seq: u64, spent_txid: String },
    #[error("ledger head {ledger_head} is behind indexed head {indexed_head}")] LedgerBehind { ledger_head: u64, indexed_head: u64 },
    #[error("ledger is empty but index holds blocks up to seq {indexed_head}")] EmptyLedger { indexed_head: u64 },
    #[error("block seq {got} skips ahead of next expected seq {expected}")] SeqGap { expected: u64, got: u64 },
}

#[derive(Error, Debug)]
pub enum RillError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] History(#[from] HistoryError),
    #[error("storage: {0}")] Storage(String),
}
