//! Durable ordered store backed by an append-only log.
//!
//! ## Directory Structure
//!
//! ```text
//! <store_path>/
//! ├─ LOCK        # Advisory lock for single-process access
//! └─ data.log    # Append-only write log
//! ```
//!
//! ## Record Format
//!
//! ```text
//! | payload_len (u32 LE) | crc32 (u32 LE) | payload |
//!
//! payload = | op_count (u32 LE) | op* |
//! op      = | tag (u8) | key_len (u32 LE) | key | [value_len (u32 LE) | value] |
//! ```
//!
//! Every `put`, `delete` and `write_batch` call appends exactly one record,
//! so a batch is replayed entirely or not at all. On open the log is replayed
//! into an in-memory ordered map; a torn or checksum-failing tail is cut off.
//!
//! A record that fails to write is truncated away before the error is
//! returned, so later records never land behind a partial one. Log I/O runs
//! on tokio's blocking pool.

use crate::batch::{BatchOp, WriteBatch};
use crate::error::{StorageError, StorageResult};
use crate::keyspace::KeyRange;
use crate::memory::{apply_ops, scan_map, OrderedMap};
use crate::store::{KeyValue, OrderedStore, ScanOptions};
use async_trait::async_trait;
use bytes::Bytes;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

const LOCK_FILE: &str = "LOCK";
const LOG_FILE: &str = "data.log";

const HEADER_SIZE: usize = 8;
const TAG_PUT: u8 = 1;
const TAG_DELETE: u8 = 2;

/// Options for [`FileStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStoreOptions {
    /// Whether to fsync the log after every record (safer but slower).
    pub sync_on_write: bool,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            sync_on_write: true,
        }
    }
}

impl FileStoreOptions {
    /// Sets whether to fsync after every record.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}

/// A durable ordered store.
///
/// Reads are served from memory; writes go to the log first and become
/// visible once the record is written.
///
/// # Example
///
/// ```no_run
/// use modelkv_storage::{FileStore, OrderedStore};
/// use std::path::Path;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = FileStore::open(Path::new("notes.db")).unwrap();
/// store.put(b"key".to_vec(), b"value".to_vec()).await.unwrap();
/// # });
/// ```
pub struct FileStore {
    path: PathBuf,
    options: FileStoreOptions,
    data: Arc<RwLock<OrderedMap>>,
    log: Arc<Mutex<File>>,
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a store in directory `path` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another process holds the store,
    /// [`StorageError::Corrupted`] if a checksummed record cannot be decoded,
    /// or an I/O error.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_with_options(path, FileStoreOptions::default())
    }

    /// Opens or creates a store with explicit options.
    ///
    /// # Errors
    ///
    /// See [`FileStore::open`].
    pub fn open_with_options(path: &Path, options: FileStoreOptions) -> StorageResult<Self> {
        fs::create_dir_all(path)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }

        let mut log = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOG_FILE))?;

        let mut bytes = Vec::new();
        log.read_to_end(&mut bytes)?;
        let (data, valid_len, records) = replay(&bytes)?;

        if valid_len < bytes.len() {
            warn!(
                path = %path.display(),
                discarded = bytes.len() - valid_len,
                "truncating torn tail of store log"
            );
            log.set_len(valid_len as u64)?;
            log.sync_all()?;
        }
        log.seek(SeekFrom::End(0))?;

        info!(
            path = %path.display(),
            records,
            keys = data.len(),
            "opened file store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            options,
            data: Arc::new(RwLock::new(data)),
            log: Arc::new(Mutex::new(log)),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    async fn append(&self, ops: Vec<BatchOp>) -> StorageResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let record = encode_record(&ops)?;
        let log = Arc::clone(&self.log);
        let data = Arc::clone(&self.data);
        let sync = self.options.sync_on_write;

        spawn_blocking(move || -> StorageResult<()> {
            // The log lock also orders map updates, so memory matches log order.
            let mut log = log.lock();
            append_record(&mut *log, &record, sync)?;
            apply_ops(&mut data.write(), ops);
            Ok(())
        })
        .await
        .map_err(|err| StorageError::backend(format!("log writer join error: {err}")))?
    }
}

/// The operations [`append_record`] needs from the log file.
trait LogFile: Write + Seek {
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Appends one record at the end of the log. On failure the log is cut
/// back to its previous length.
fn append_record<L: LogFile>(log: &mut L, record: &[u8], sync: bool) -> io::Result<()> {
    let start = log.seek(SeekFrom::End(0))?;
    let written = log
        .write_all(record)
        .and_then(|()| if sync { log.sync() } else { Ok(()) });

    if let Err(err) = written {
        let rollback = log
            .truncate_to(start)
            .and_then(|()| log.seek(SeekFrom::End(0)))
            .and_then(|_| if sync { log.sync() } else { Ok(()) });
        if let Err(rollback) = rollback {
            warn!(error = %rollback, offset = start, "could not remove partial log record");
        }
        return Err(err);
    }
    Ok(())
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("keys", &self.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OrderedStore for FileStore {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.append(vec![BatchOp::Put { key, value }]).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.append(vec![BatchOp::Delete { key: key.to_vec() }]).await
    }

    async fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        self.append(batch.into_ops()).await
    }

    async fn scan(&self, range: KeyRange, options: ScanOptions) -> StorageResult<Vec<KeyValue>> {
        Ok(scan_map(&self.data.read(), &range, options))
    }
}

fn len_u32(len: usize) -> StorageResult<u32> {
    u32::try_from(len).map_err(|_| StorageError::backend(format!("entry of {len} bytes too large")))
}

fn encode_record(ops: &[BatchOp]) -> StorageResult<Vec<u8>> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&len_u32(ops.len())?.to_le_bytes());
    for op in ops {
        match op {
            BatchOp::Put { key, value } => {
                payload.push(TAG_PUT);
                payload.extend_from_slice(&len_u32(key.len())?.to_le_bytes());
                payload.extend_from_slice(key);
                payload.extend_from_slice(&len_u32(value.len())?.to_le_bytes());
                payload.extend_from_slice(value);
            }
            BatchOp::Delete { key } => {
                payload.push(TAG_DELETE);
                payload.extend_from_slice(&len_u32(key.len())?.to_le_bytes());
                payload.extend_from_slice(key);
            }
        }
    }

    let mut record = Vec::with_capacity(HEADER_SIZE + payload.len());
    record.extend_from_slice(&len_u32(payload.len())?.to_le_bytes());
    record.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    record.extend_from_slice(&payload);
    Ok(record)
}

/// Replays log bytes, returning the map, the length of the valid prefix
/// and the number of records applied.
fn replay(bytes: &[u8]) -> StorageResult<(OrderedMap, usize, usize)> {
    let mut map = OrderedMap::new();
    let mut offset = 0;
    let mut records = 0;

    while bytes.len() - offset >= HEADER_SIZE {
        let len = read_u32(bytes, offset) as usize;
        let crc = read_u32(bytes, offset + 4);
        let start = offset + HEADER_SIZE;
        let Some(end) = start.checked_add(len).filter(|end| *end <= bytes.len()) else {
            break;
        };
        let payload = &bytes[start..end];
        if crc32fast::hash(payload) != crc {
            break;
        }
        apply_ops(&mut map, decode_payload(payload, offset)?);
        offset = end;
        records += 1;
    }

    Ok((map, offset, records))
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

fn decode_payload(payload: &[u8], record_offset: usize) -> StorageResult<Vec<BatchOp>> {
    let corrupted =
        || StorageError::corrupted(format!("malformed log record at offset {record_offset}"));

    let mut cursor = std::io::Cursor::new(payload);
    let take_u32 = |cursor: &mut std::io::Cursor<&[u8]>| -> StorageResult<u32> {
        let mut buf = [0u8; 4];
        cursor.read_exact(&mut buf).map_err(|_| corrupted())?;
        Ok(u32::from_le_bytes(buf))
    };
    let take_bytes = |cursor: &mut std::io::Cursor<&[u8]>, len: u32| -> StorageResult<Vec<u8>> {
        let mut buf = vec![0u8; len as usize];
        cursor.read_exact(&mut buf).map_err(|_| corrupted())?;
        Ok(buf)
    };

    let count = take_u32(&mut cursor)?;
    let mut ops = Vec::new();
    for _ in 0..count {
        let mut tag = [0u8; 1];
        cursor.read_exact(&mut tag).map_err(|_| corrupted())?;
        let key_len = take_u32(&mut cursor)?;
        let key = take_bytes(&mut cursor, key_len)?;
        match tag[0] {
            TAG_PUT => {
                let value_len = take_u32(&mut cursor)?;
                let value = take_bytes(&mut cursor, value_len)?;
                ops.push(BatchOp::Put { key, value });
            }
            TAG_DELETE => ops.push(BatchOp::Delete { key }),
            _ => return Err(corrupted()),
        }
    }
    if cursor.position() as usize != payload.len() {
        return Err(corrupted());
    }
    Ok(ops)
}
