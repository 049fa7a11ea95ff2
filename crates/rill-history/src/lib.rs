//! # rill-history: Transaction, output, and address history for Rill.
//!
//! Replays the ledger into secondary indexes that answer explorer lookups
//! the ledger cannot serve directly:
//! - [`history::HistoryDb`]: replay driver and query surface
//! - [`transactions::TransactionIndex`]: txid → transaction and block seq
//! - [`outputs::OutputIndex`]: output ID → output with spend status
//! - [`address::AddressIndex`]: address → outputs received / spent
//! - [`storage::RocksStore`]: persistent bucket store backed by RocksDB
//! - [`config::HistoryConfig`]: indexer configuration

pub mod address;
pub mod config;
pub mod history;
pub mod kv;
pub mod outputs;
pub mod storage;
pub mod transactions;

pub use config::HistoryConfig;
pub use history::HistoryDb;
pub use kv::{KvStore, MemoryStore};
pub use storage::RocksStore;
