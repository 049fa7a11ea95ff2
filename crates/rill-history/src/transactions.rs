//! Transaction index: txid → transaction plus the seq of its block.

use std::sync::Arc;

use serde::Serialize;

use rill_core::error::RillError;
use rill_core::types::{Hash256, Transaction};

use crate::kv::{self, KvStore};

/// A transaction as recorded by the history index.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct HistoryTransaction {
    /// The raw transaction.
    pub tx: Transaction,
    /// Seq of the block that included it.
    pub block_seq: u64,
}

impl HistoryTransaction {
    /// Transaction ID, the key this record is stored under.
    pub fn txid(&self) -> Result<Hash256, RillError> {
        Ok(self.tx.txid()?)
    }
}

/// Durable txid → [`HistoryTransaction`] mapping.
pub struct TransactionIndex<S> {
    store: Arc<S>,
}

impl<S: KvStore> TransactionIndex<S> {
    pub const BUCKET: &'static str = "transactions";

    /// Open the index, creating its bucket if needed.
    pub fn open(store: Arc<S>) -> Result<Self, RillError> {
        store.open_bucket(Self::BUCKET)?;
        Ok(Self { store })
    }

    /// Look up a transaction by ID.
    pub fn get(&self, txid: &Hash256) -> Result<Option<HistoryTransaction>, RillError> {
        self.store
            .get(Self::BUCKET, txid.as_bytes())?
            .map(|bytes| kv::decode(&bytes))
            .transpose()
    }

    /// Store a record under its txid, overwriting any previous record.
    pub fn put(&self, record: &HistoryTransaction) -> Result<(), RillError> {
        let txid = record.txid()?;
        self.store
            .put(Self::BUCKET, txid.as_bytes(), &kv::encode(record)?)
    }

    pub fn contains(&self, txid: &Hash256) -> Result<bool, RillError> {
        Ok(self.store.get(Self::BUCKET, txid.as_bytes())?.is_some())
    }
}
