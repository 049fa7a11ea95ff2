//! Bucketed key-value storage interface and in-memory implementation.
//!
//! Provides the [`KvStore`] trait that every history index writes through.
//! The [`MemoryStore`] is suitable for testing; the production index uses
//! RocksDB ([`RocksStore`](crate::storage::RocksStore)).

use std::collections::HashMap;

use parking_lot::RwLock;

use rill_core::error::RillError;

/// Durable, named-bucket key→value storage.
///
/// A bucket must be opened with [`open_bucket`](KvStore::open_bucket) before
/// it is read or written. Each `put` is atomic for its single record; there
/// is no cross-bucket transaction.
pub trait KvStore: Send + Sync {
    /// Create the bucket if it does not exist yet. Opening twice is a no-op.
    fn open_bucket(&self, name: &str) -> Result<(), RillError>;

    /// Read the value stored under `key`. `None` if absent.
    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>, RillError>;

    /// Insert or overwrite the value stored under `key`.
    fn put(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<(), RillError>;
}

/// Encode a value with bincode (standard config).
pub(crate) fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>, RillError> {
    bincode::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| RillError::Storage(e.to_string()))
}

/// Decode a value written by [`encode`].
pub(crate) fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, RillError> {
    let (value, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| RillError::Storage(e.to_string()))?;
    Ok(value)
}

type Bucket = HashMap<Vec<u8>, Vec<u8>>;

/// In-memory bucket store for testing.
///
/// No persistence and no file lock.
#[derive(Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, Bucket>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a bucket. `0` if the bucket does not exist.
    pub fn len(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, HashMap::len)
    }
}

impl KvStore for MemoryStore {
    fn open_bucket(&self, name: &str) -> Result<(), RillError> {
        self.buckets.write().entry(name.to_string()).or_default();
        Ok(())
    }

    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>, RillError> {
        let buckets = self.buckets.read();
        let b = buckets
            .get(bucket)
            .ok_or_else(|| RillError::Storage(format!("missing bucket: {bucket}")))?;
        Ok(b.get(key).cloned())
    }

    fn put(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<(), RillError> {
        let mut buckets = self.buckets.write();
        let b = buckets
            .get_mut(bucket)
            .ok_or_else(|| RillError::Storage(format!("missing bucket: {bucket}")))?;
        b.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
