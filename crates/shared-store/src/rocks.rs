//! # RocksDB KV Adapter
//!
//! Production persistence behind the same port as the in-memory store.
//! RocksDB's total ordering over keys satisfies the ascending-iteration
//! contract of `KvRead::scan_prefix`.

use crate::errors::StoreError;
use crate::kv::{KvRead, KvStore, KvWrite};
use rocksdb::{Direction, IteratorMode, Options, DB};
use std::path::Path;

/// RocksDB-backed ordered KV store.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open (or create) a database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { db })
    }
}

impl KvRead for RocksStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.db
            .get(key)
            .unwrap_or_else(|e| panic!("rocksdb read failed: {e}"))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
            .map(|item| item.unwrap_or_else(|e| panic!("rocksdb iterator failed: {e}")))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect()
    }
}

impl KvWrite for RocksStore {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.db
            .put(&key, &value)
            .unwrap_or_else(|e| panic!("rocksdb write failed: {e}"));
    }

    fn delete(&mut self, key: &[u8]) {
        self.db
            .delete(key)
            .unwrap_or_else(|e| panic!("rocksdb delete failed: {e}"));
    }
}

impl KvStore for RocksStore {}
