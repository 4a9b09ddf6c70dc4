use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use rocksdb::{
    DBRawIteratorWithThreadMode, DBWithThreadMode, MultiThreaded, Options,
    SnapshotWithThreadMode, WriteBatch, WriteOptions,
};
use tracing::{debug, info};

use crate::{
    cursor::VersionCursor,
    error::{Result, StoreError, map_db_error},
    observability::timed,
};

type Db = DBWithThreadMode<MultiThreaded>;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub sync_writes: bool,
    pub max_open_files: i32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sync_writes: true,
            max_open_files: 512,
        }
    }
}

/// Bucket-partitioned ordered store: one column family per bucket, a single
/// writer at a time, and readers pinned to a point-in-time snapshot.
pub struct Engine {
    db: Db,
    path: PathBuf,
    write_lock: Mutex<()>,
    read_only: bool,
    sync_writes: bool,
}

impl Engine {
    /// Opens or creates the store at `path`, creating any missing bucket.
    pub fn open<'b>(
        path: &Path,
        buckets: impl IntoIterator<Item = &'b str>,
        engine_options: &EngineOptions,
    ) -> Result<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);
        options.create_missing_column_families(true);
        options.set_max_open_files(engine_options.max_open_files);

        let init_error = |err: rocksdb::Error| StoreError::StoreInit {
            path: path.to_path_buf(),
            reason: err.to_string(),
        };
        let families = column_families(&options, path, buckets).map_err(init_error)?;
        let db = Db::open_cf(&options, path, &families).map_err(init_error)?;
        info!(path = %path.display(), buckets = families.len(), "opened snapshot store");

        Ok(Self {
            db,
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
            read_only: false,
            sync_writes: engine_options.sync_writes,
        })
    }

    /// Opens an existing store without taking the write lock on disk. Every
    /// bucket must already exist.
    pub fn open_read_only<'b>(
        path: &Path,
        buckets: impl IntoIterator<Item = &'b str>,
    ) -> Result<Self> {
        let mut options = Options::default();
        options.create_if_missing(false);

        let init_error = |reason: String| StoreError::StoreInit {
            path: path.to_path_buf(),
            reason,
        };
        let existing: BTreeSet<String> = Db::list_cf(&options, path)
            .map_err(|err| init_error(err.to_string()))?
            .into_iter()
            .collect();
        let wanted: Vec<&str> = buckets.into_iter().collect();
        if let Some(missing) = wanted.iter().find(|name| !existing.contains(**name)) {
            return Err(init_error(format!("bucket '{missing}' does not exist")));
        }

        let db = Db::open_cf_for_read_only(&options, path, &existing, false)
            .map_err(|err| init_error(err.to_string()))?;
        info!(path = %path.display(), "opened snapshot store read-only");

        Ok(Self {
            db,
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
            read_only: true,
            sync_writes: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Runs `f` inside a read transaction. Everything read through the
    /// transaction reflects the state committed when it began.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTxn<'_>) -> Result<T>,
    {
        let txn = ReadTxn {
            db: &self.db,
            snapshot: self.db.snapshot(),
        };
        f(&txn)
    }

    /// Runs `f` inside the single write transaction. Writes staged by `f` are
    /// committed only when it returns `Ok`; any error discards them.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T>,
    {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }

        let _guard = self.write_lock.lock();
        let mut txn = WriteTxn {
            db: &self.db,
            batch: WriteBatch::default(),
        };
        let value = f(&mut txn)?;

        let staged = txn.batch.len();
        let mut write_options = WriteOptions::default();
        write_options.set_sync(self.sync_writes);

        timed("rocksdb_write", || {
            self.db
                .write_opt(txn.batch, &write_options)
                .map_err(map_db_error)
        })?;

        debug!(staged, "committed write transaction");
        Ok(value)
    }
}

pub struct ReadTxn<'a> {
    db: &'a Db,
    snapshot: SnapshotWithThreadMode<'a, Db>,
}

impl<'a> ReadTxn<'a> {
    pub fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| unknown_bucket(bucket))?;
        self.snapshot.get_cf(&cf, key).map_err(map_db_error)
    }

    pub fn cursor(&self, bucket: &str) -> Result<BucketCursor<'_>> {
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| unknown_bucket(bucket))?;
        Ok(BucketCursor {
            iter: self.snapshot.raw_iterator_cf(&cf),
            position: Position::Unset,
        })
    }

    /// Number of keys stored in `bucket` as of this transaction.
    pub fn count(&self, bucket: &str) -> Result<u64> {
        let mut cursor = self.cursor(bucket)?;
        cursor.iter.seek_to_first();
        let mut total = 0u64;
        while cursor.iter.valid() {
            total += 1;
            cursor.iter.next();
        }
        cursor.iter.status().map_err(map_db_error)?;
        Ok(total)
    }
}

pub struct WriteTxn<'a> {
    db: &'a Db,
    batch: WriteBatch,
}

impl<'a> WriteTxn<'a> {
    pub fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self
            .db
            .cf_handle(bucket)
            .ok_or_else(|| unknown_bucket(bucket))?;
        self.batch.put_cf(&cf, key, value);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Unset,
    OnKey,
    PastEnd,
}

/// Snapshot-bound cursor over one bucket.
pub struct BucketCursor<'a> {
    iter: DBRawIteratorWithThreadMode<'a, Db>,
    position: Position,
}

impl BucketCursor<'_> {
    fn current(&mut self) -> Result<Option<Vec<u8>>> {
        if self.iter.valid() {
            self.position = Position::OnKey;
            return Ok(self.iter.key().map(<[u8]>::to_vec));
        }
        self.iter.status().map_err(map_db_error)?;
        self.position = Position::Unset;
        Ok(None)
    }
}

impl VersionCursor for BucketCursor<'_> {
    fn seek(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.iter.seek(key);
        let found = self.current()?;
        if found.is_none() {
            self.position = Position::PastEnd;
        }
        Ok(found)
    }

    fn prev(&mut self) -> Result<Option<Vec<u8>>> {
        match self.position {
            Position::OnKey => self.iter.prev(),
            Position::PastEnd => self.iter.seek_to_last(),
            Position::Unset => return Ok(None),
        }
        self.current()
    }
}

fn column_families<'b>(
    options: &Options,
    path: &Path,
    buckets: impl IntoIterator<Item = &'b str>,
) -> std::result::Result<Vec<String>, rocksdb::Error> {
    let mut families = BTreeSet::new();
    // A fresh path has no families to list yet.
    if path.join("CURRENT").exists() {
        families.extend(Db::list_cf(options, path)?);
    }
    families.extend(buckets.into_iter().map(str::to_string));
    Ok(families.into_iter().collect())
}

fn unknown_bucket(bucket: &str) -> StoreError {
    StoreError::Storage(format!("bucket '{bucket}' does not exist"))
}
