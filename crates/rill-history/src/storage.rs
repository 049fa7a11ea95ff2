//! RocksDB-backed bucket storage.
//!
//! Implements [`KvStore`] with one RocksDB column family per bucket. The
//! database is opened in multi-threaded mode so that buckets can be created
//! through a shared reference after open.
//!
//! RocksDB holds an exclusive `LOCK` file on the database directory, so a
//! second open of the same path fails while the first handle is alive.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{BoundColumnFamily, DBWithThreadMode, MultiThreaded, Options};

use rill_core::error::RillError;

use crate::kv::KvStore;

type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed persistent bucket store.
pub struct RocksStore {
    db: Db,
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path.
    ///
    /// Every column family already present on disk is reopened so that
    /// previously created buckets remain readable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RillError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // A fresh directory has no column family list yet.
        let existing = Db::list_cf(&db_opts, path.as_ref()).unwrap_or_default();

        let db = Db::open_cf(&db_opts, path.as_ref(), existing)
            .map_err(|e| RillError::Storage(e.to_string()))?;

        tracing::debug!(path = %path.as_ref().display(), "opened history store");
        Ok(Self { db })
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), RillError> {
        self.db
            .flush()
            .map_err(|e| RillError::Storage(e.to_string()))
    }

    /// Get a column family handle.
    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>, RillError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| RillError::Storage(format!("missing bucket: {name}")))
    }
}

impl KvStore for RocksStore {
    fn open_bucket(&self, name: &str) -> Result<(), RillError> {
        if self.db.cf_handle(name).is_some() {
            return Ok(());
        }
        self.db
            .create_cf(name, &Options::default())
            .map_err(|e| RillError::Storage(e.to_string()))?;
        tracing::info!(bucket = name, "created history bucket");
        Ok(())
    }

    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>, RillError> {
        let cf = self.cf_handle(bucket)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| RillError::Storage(e.to_string()))
    }

    fn put(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<(), RillError> {
        let cf = self.cf_handle(bucket)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| RillError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a temporary RocksStore.
    fn temp_store() -> (RocksStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksStore::open(dir.path().join("history")).unwrap();
        (store, dir)
    }

    #[test]
    fn open_bucket_is_idempotent() {
        let (store, _dir) = temp_store();
        store.open_bucket("outputs").unwrap();
        store.open_bucket("outputs").unwrap();
        assert!(store.get("outputs", b"k").unwrap().is_none());
    }

    #[test]
    fn put_get_overwrite() {
        let (store, _dir) = temp_store();
        store.open_bucket("b").unwrap();
        store.put("b", b"k", b"one").unwrap();
        store.put("b", b"k", b"two").unwrap();
        assert_eq!(store.get("b", b"k").unwrap().unwrap(), b"two");
    }

    #[test]
    fn unopened_bucket_errors() {
        let (store, _dir) = temp_store();
        let err = store.get("nope", b"k").unwrap_err();
        assert!(
            matches!(err, RillError::Storage(ref msg) if msg.contains("nope")),
            "expected missing bucket error, got: {err:?}"
        );
    }

    #[test]
    fn buckets_and_data_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");
        {
            let store = RocksStore::open(&path).unwrap();
            store.open_bucket("b").unwrap();
            store.put("b", b"k", b"v").unwrap();
            store.flush().unwrap();
        }
        let store = RocksStore::open(&path).unwrap();
        // Readable without reopening the bucket.
        assert_eq!(store.get("b", b"k").unwrap().unwrap(), b"v");
    }

    #[test]
    fn second_open_fails_while_locked() {
        let (_store, dir) = temp_store();
        let result = RocksStore::open(dir.path().join("history"));
        assert!(matches!(result, Err(RillError::Storage(_))));
    }
}
