//! redb storage backend, the default persistent store.
//!
//! redb is a pure-Rust B-tree with ACID transactions. Every `put` commits its
//! own write transaction, so a reader sees a request either before or after an
//! update and never in between.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadOnlyTable, ReadableTable, TableDefinition};
use tracing::debug;

use crate::{StorageBackend, StorageError, run_blocking};

/// All keys live in one table; namespacing is done with key prefixes.
const DATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("data");

fn txn_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

fn table_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::MissingTable {
        name: format!("data: {e}"),
    }
}

/// A storage backend backed by a single redb file.
///
/// Cloning is cheap and shares the open database.
///
/// # Examples
///
/// ```no_run
/// # use leadbox_storage::RedbBackend;
/// let backend = RedbBackend::open("/var/lib/leadbox/leadbox.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open the database file at `path`, creating it and the data table if
    /// they do not exist. The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file cannot be opened or created,
    /// and [`StorageError::Transaction`] if the data table cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // Read transactions cannot create tables.
        let txn = db.begin_write().map_err(txn_error)?;
        txn.open_table(DATA_TABLE).map_err(table_error)?;
        txn.commit().map_err(txn_error)?;

        debug!(path = %path.display(), "redb storage opened");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(db: &Database) -> Result<ReadOnlyTable<&'static str, &'static [u8]>, StorageError> {
        db.begin_read()
            .map_err(txn_error)?
            .open_table(DATA_TABLE)
            .map_err(table_error)
    }
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        run_blocking("redb get", move || {
            let table = Self::read_table(&db)?;
            let value = table.get(key.as_str()).map_err(|e| StorageError::Read {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            Ok(value.map(|v| v.value().to_vec()))
        })
        .await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        let value = value.to_vec();
        run_blocking("redb put", move || {
            let txn = db.begin_write().map_err(txn_error)?;
            {
                let mut table = txn.open_table(DATA_TABLE).map_err(table_error)?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| StorageError::Write {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(txn_error)
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let db = Arc::clone(&self.db);
        let prefix = prefix.to_owned();
        run_blocking("redb list", move || {
            let list_error = |e: redb::StorageError| StorageError::List {
                prefix: prefix.clone(),
                reason: e.to_string(),
            };
            let table = Self::read_table(&db)?;

            let mut keys = Vec::new();
            for entry in table.range(prefix.as_str()..).map_err(list_error)? {
                let (key, _) = entry.map_err(list_error)?;
                let key = key.value();
                if !key.starts_with(prefix.as_str()) {
                    break;
                }
                keys.push(key.to_owned());
            }
            Ok(keys)
        })
        .await
    }
}
