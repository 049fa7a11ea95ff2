//! Address → output ID multi-maps.
//!
//! Two instances exist over separate buckets: outputs an address has
//! received ([`AddressIndex::received`]) and outputs it has spent
//! ([`AddressIndex::spent`]). Each address maps to its IDs in first-seen
//! order; an ID already present is not added again.

use std::sync::Arc;

use rill_core::error::RillError;
use rill_core::types::Hash256;

use crate::kv::{self, KvStore};

const BUCKET_IN: &str = "address_in";
const BUCKET_OUT: &str = "address_out";

/// Durable address → set of output IDs.
pub struct AddressIndex<S> {
    store: Arc<S>,
    bucket: &'static str,
}

impl<S: KvStore> AddressIndex<S> {
    /// Open the index of outputs each address has received.
    pub fn received(store: Arc<S>) -> Result<Self, RillError> {
        Self::open(store, BUCKET_IN)
    }

    /// Open the index of outputs each address has spent.
    pub fn spent(store: Arc<S>) -> Result<Self, RillError> {
        Self::open(store, BUCKET_OUT)
    }

    fn open(store: Arc<S>, bucket: &'static str) -> Result<Self, RillError> {
        store.open_bucket(bucket)?;
        Ok(Self { store, bucket })
    }

    /// Bucket backing this index.
    pub fn bucket(&self) -> &'static str {
        self.bucket
    }

    /// Record `uxid` under `pubkey_hash`.
    ///
    /// Returns `false` without writing if the ID was already recorded.
    pub fn add(&self, pubkey_hash: &Hash256, uxid: Hash256) -> Result<bool, RillError> {
        let mut ids = self.list(pubkey_hash)?;
        if ids.contains(&uxid) {
            return Ok(false);
        }
        ids.push(uxid);
        self.store
            .put(self.bucket, pubkey_hash.as_bytes(), &kv::encode(&ids)?)?;
        Ok(true)
    }

    /// All IDs recorded under `pubkey_hash`. Empty for an unknown address.
    pub fn list(&self, pubkey_hash: &Hash256) -> Result<Vec<Hash256>, RillError> {
        match self.store.get(self.bucket, pubkey_hash.as_bytes())? {
            Some(bytes) => kv::decode(&bytes),
            None => Ok(Vec::new()),
        }
    }
}
