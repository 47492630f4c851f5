//! Durable local key-value storage.
//!
//! # Responsibilities
//! - Persist small state blobs across process restarts (block list, audit
//!   settings, raw key material)
//! - Survive crashes without corrupting previously written state
//!
//! # Design Decisions
//! - One JSON file holding a string→JSON map; small enough to rewrite whole
//! - Writes go to a temp file then rename, so readers never see a partial file
//! - Read errors on open fall back to an empty store (state is best-effort)

use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SecurityResult;

/// File-backed key-value store for the security subsystems.
///
/// All values are JSON; callers serialize their own types. The in-memory map
/// is authoritative between writes, the file is rewritten on every mutation.
pub struct LocalStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl LocalStore {
    /// Open a store at `path`, loading existing contents if the file exists.
    ///
    /// A missing file yields an empty store. An unreadable or unparsable file
    /// is treated as empty too, with the problem logged, because every
    /// consumer of this store can regenerate its state.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match File::open(&path) {
            Ok(file) => {
                let reader = BufReader::new(file);
                match serde_json::from_reader::<_, HashMap<String, Value>>(reader) {
                    Ok(map) => map,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Store file unreadable, starting empty");
                        HashMap::new()
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Store file unreadable, starting empty");
                HashMap::new()
            }
        };

        if !entries.is_empty() {
            tracing::info!(path = %path.display(), keys = entries.len(), "Loaded local store");
        }

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Fetch and deserialize the value under `key`.
    ///
    /// Returns `None` when the key is absent or the stored value does not
    /// deserialize into `T` (stale shape after an upgrade).
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock().expect("store mutex poisoned");
        let value = entries.get(key)?.clone();
        drop(entries);
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "Stored value has unexpected shape");
                None
            }
        }
    }

    /// Store `value` under `key` and flush to disk.
    pub fn put<T: serde::Serialize>(&self, key: &str, value: &T) -> SecurityResult<()> {
        let json = serde_json::to_value(value)?;
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.insert(key.to_string(), json);
        self.flush(&entries)
    }

    /// Remove `key` and flush to disk. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) -> SecurityResult<()> {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }

    /// Whether `key` currently exists in the store.
    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().expect("store mutex poisoned");
        entries.contains_key(key)
    }

    // Rewrite the backing file. Temp file + rename keeps the last good state
    // intact if the process dies mid-write.
    fn flush(&self, entries: &HashMap<String, Value>) -> SecurityResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, entries)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
