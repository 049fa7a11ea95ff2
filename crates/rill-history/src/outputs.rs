//! Output index: output ID → output record with spend status.
//!
//! Records are created unspent and updated once, when a later transaction
//! consumes them. Nothing is ever deleted. The index itself does no
//! validation; [`HistoryDb`](crate::history::HistoryDb) decides when a
//! write is legal.

use std::sync::Arc;

use serde::Serialize;

use rill_core::error::RillError;
use rill_core::types::{Hash256, UxOut};

use crate::kv::{self, KvStore};

/// Which transaction consumed an output, and in which block.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct SpendMarker {
    pub block_seq: u64,
    pub txid: Hash256,
}

/// An output as recorded by the history index.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct HistoryUxOut {
    pub out: UxOut,
    /// `None` while unspent.
    pub spent: Option<SpendMarker>,
}

impl HistoryUxOut {
    /// A freshly created, unspent output.
    pub fn unspent(out: UxOut) -> Self {
        Self { out, spent: None }
    }

    /// Output ID, the key this record is stored under.
    pub fn hash(&self) -> Hash256 {
        self.out.hash()
    }

    pub fn is_spent(&self) -> bool {
        self.spent.is_some()
    }

    /// Owning address.
    pub fn pubkey_hash(&self) -> &Hash256 {
        self.out.pubkey_hash()
    }
}

/// Durable output ID → [`HistoryUxOut`] mapping.
pub struct OutputIndex<S> {
    store: Arc<S>,
}

impl<S: KvStore> OutputIndex<S> {
    pub const BUCKET: &'static str = "outputs";

    /// Open the index, creating its bucket if needed.
    pub fn open(store: Arc<S>) -> Result<Self, RillError> {
        store.open_bucket(Self::BUCKET)?;
        Ok(Self { store })
    }

    /// Look up an output by ID.
    pub fn get(&self, uxid: &Hash256) -> Result<Option<HistoryUxOut>, RillError> {
        self.store
            .get(Self::BUCKET, uxid.as_bytes())?
            .map(|bytes| kv::decode(&bytes))
            .transpose()
    }

    /// Store the full record under its output ID, overwriting any previous one.
    pub fn put(&self, record: &HistoryUxOut) -> Result<(), RillError> {
        self.store
            .put(Self::BUCKET, record.hash().as_bytes(), &kv::encode(record)?)
    }

    pub fn contains(&self, uxid: &Hash256) -> Result<bool, RillError> {
        Ok(self.store.get(Self::BUCKET, uxid.as_bytes())?.is_some())
    }
}
