//! `RocksDB` storage backend.
//!
//! For deployments that already run `RocksDB` tooling. Writes are synced to
//! the WAL before `put` returns, so an accepted contact request survives a
//! crash of the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocksdb::{DBWithThreadMode, MultiThreaded, Options, PrefixRange, ReadOptions, WriteOptions};
use tracing::debug;

use crate::{StorageBackend, StorageError, run_blocking};

type Db = DBWithThreadMode<MultiThreaded>;

/// A storage backend backed by a `RocksDB` directory.
///
/// # Examples
///
/// ```no_run
/// # use leadbox_storage::RocksDbBackend;
/// let backend = RocksDbBackend::open("/var/lib/leadbox/rocksdb").unwrap();
/// ```
#[derive(Clone)]
pub struct RocksDbBackend {
    db: Arc<Db>,
    path: PathBuf,
}

impl std::fmt::Debug for RocksDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RocksDbBackend {
    /// Open the database directory at `path`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if `RocksDB` refuses the directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Db::open(&opts, path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), "RocksDB storage opened");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl StorageBackend for RocksDbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        run_blocking("rocksdb get", move || {
            db.get(key.as_bytes())
                .map_err(|e| StorageError::Read {
                    key,
                    reason: e.into_string(),
                })
        })
        .await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        let value = value.to_vec();
        run_blocking("rocksdb put", move || {
            let mut write_opts = WriteOptions::default();
            write_opts.set_sync(true);
            db.put_opt(key.as_bytes(), &value, &write_opts)
                .map_err(|e| StorageError::Write {
                    key,
                    reason: e.into_string(),
                })
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let db = Arc::clone(&self.db);
        let prefix = prefix.to_owned();
        run_blocking("rocksdb list", move || {
            let mut read_opts = ReadOptions::default();
            read_opts.set_iterate_range(PrefixRange(prefix.as_bytes()));

            db.iterator_opt(rocksdb::IteratorMode::Start, read_opts)
                .map(|entry| {
                    let (key, _) = entry.map_err(|e| StorageError::List {
                        prefix: prefix.clone(),
                        reason: e.into_string(),
                    })?;
                    String::from_utf8(key.into_vec()).map_err(|e| StorageError::InvalidKey {
                        reason: e.to_string(),
                    })
                })
                .collect()
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        run_blocking("rocksdb exists", move || {
            db.get_pinned(key.as_bytes())
                .map(|value| value.is_some())
                .map_err(|e| StorageError::Read {
                    key,
                    reason: e.into_string(),
                })
        })
        .await
    }
}
