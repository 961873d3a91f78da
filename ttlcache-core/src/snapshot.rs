//! Snapshot persistence for [`Store`].
//!
//! A snapshot is a JSON document:
//!
//! ```json
//! {
//!   "format": "ttlcache-snapshot",
//!   "version": 1,
//!   "entries": {
//!     "k1": { "value": { "type": "str", "data": "hello" }, "expires_at": 1700000000000000000 },
//!     "k2": { "value": { "type": "int", "data": 42 }, "expires_at": 0 }
//!   }
//! }
//! ```
//!
//! `expires_at` is in Unix nanoseconds, `0` meaning "never". Entries are
//! written as they are in memory, expired ones included; expiry is checked
//! again when the snapshot is merged and when entries are read.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::entry::{now_nanos, Entry};
use crate::error::{CacheError, Result};
use crate::store::Store;

/// Marker identifying a ttlcache snapshot
pub const SNAPSHOT_FORMAT: &str = "ttlcache-snapshot";

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format: &'static str,
    version: u32,
    entries: &'a HashMap<String, Entry>,
}

#[derive(Deserialize)]
struct SnapshotHeader {
    format: String,
    version: u32,
    entries: serde_json::Value,
}

/// Reads and validates a whole snapshot before anything touches the store
fn decode<R: Read>(reader: R) -> Result<HashMap<String, Entry>> {
    let header: SnapshotHeader =
        serde_json::from_reader(reader).map_err(CacheError::decoding)?;

    if header.format != SNAPSHOT_FORMAT {
        return Err(CacheError::Decode(format!(
            "unexpected format marker `{}`",
            header.format
        )));
    }
    if header.version != SNAPSHOT_VERSION {
        return Err(CacheError::Decode(format!(
            "unsupported snapshot version {} (expected {})",
            header.version, SNAPSHOT_VERSION
        )));
    }

    serde_json::from_value(header.entries).map_err(CacheError::decoding)
}

/// Directory that receives the temporary file for a save to `path`
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

impl Store {
    /// Writes every entry to `writer`, expired ones included, and returns
    /// how many entries were written.
    ///
    /// The shared lock is held for the whole encode and write, so the
    /// snapshot is consistent but a slow writer stalls every writer of the
    /// store for as long as it takes.
    ///
    /// # Errors
    ///
    /// - `CacheError::Encode` if a value has no snapshot representation
    /// - `CacheError::Io` if writing fails
    pub fn save<W: Write>(&self, mut writer: W) -> Result<usize> {
        let items = self.inner().items.read();

        for (key, entry) in items.iter() {
            entry
                .value()
                .check_encodable()
                .map_err(|reason| CacheError::Encode(format!("key {}: {}", key, reason)))?;
        }

        let snapshot = SnapshotRef {
            format: SNAPSHOT_FORMAT,
            version: SNAPSHOT_VERSION,
            entries: &*items,
        };
        serde_json::to_writer(&mut writer, &snapshot).map_err(CacheError::encoding)?;
        writer.flush()?;

        tracing::debug!(entries = items.len(), "snapshot written");
        Ok(items.len())
    }

    /// Decodes a snapshot from `reader` and merges it into the store.
    ///
    /// A decoded entry overwrites the live one only if the key is absent or
    /// the live entry has expired; live entries always win. Returns the
    /// number of decoded entries that were merged.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Decode` (or `CacheError::Io`) if the snapshot
    /// cannot be read in full. The store is unchanged in that case.
    pub fn load<R: Read>(&self, reader: R) -> Result<usize> {
        let decoded = decode(reader)?;
        let total = decoded.len();

        let now = now_nanos();
        let mut merged = 0;
        {
            let mut items = self.inner().items.write();
            for (key, entry) in decoded {
                match items.get(&key) {
                    Some(live) if !live.is_expired_at(now) => {
                        tracing::debug!(key = %key, "live entry kept over snapshot entry");
                    }
                    _ => {
                        items.insert(key, entry);
                        merged += 1;
                    }
                }
            }
        }

        tracing::debug!(merged, skipped = total - merged, "snapshot merged");
        Ok(merged)
    }

    /// Saves a snapshot to `path` and returns how many entries were written.
    ///
    /// Each call writes to its own uniquely named temporary file next to
    /// `path` and renames it into place. Concurrent saves to the same path
    /// never share a temporary file, and a failed save leaves any previous
    /// snapshot intact.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();

        // Dropped (and removed) on any early return
        let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
        let written = {
            let mut writer = BufWriter::new(&mut tmp);
            self.save(&mut writer)?
        };
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;

        tracing::info!(path = %path.display(), entries = written, "snapshot saved");
        Ok(written)
    }

    /// Loads a snapshot from `path` and merges it into the store.
    ///
    /// # Errors
    ///
    /// `CacheError::Io` if the file cannot be opened or read; nothing is
    /// merged in that case.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let merged = self.load(BufReader::new(file))?;

        tracing::info!(path = %path.display(), merged, "snapshot loaded");
        Ok(merged)
    }
}
