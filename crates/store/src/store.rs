//! TTL-aware key-value store with a durable JSON snapshot
//!
//! Keys are namespaced strings; values are arbitrary JSON. The whole table
//! sits behind one lock, and the snapshot is rewritten while that lock is
//! held, so concurrent writers can never interleave a file write.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{Clock, Result, StoreError, SystemClock};

/// One stored value and its absolute deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: Value,
    /// Milliseconds since the Unix epoch, `None` for no expiry
    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<u64>,
}

impl StoredEntry {
    /// The entry stays readable up to and including its deadline
    pub fn is_expired(&self, now_millis: u64) -> bool {
        matches!(self.expires_at, Some(deadline) if now_millis > deadline)
    }
}

type Table = BTreeMap<String, StoredEntry>;

/// Persistent key-value store with lazy expiry
pub struct TtlStore {
    /// Snapshot location, `None` for a store that lives only in memory
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    entries: Mutex<Table>,
}

impl TtlStore {
    /// Open the store at `path` using the system clock
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Open the store at `path` with a custom clock
    pub fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = load_snapshot(&path);
        info!("Opened store {:?} with {} entries", path, entries.len());
        Self {
            path: Some(path),
            clock,
            entries: Mutex::new(entries),
        }
    }

    /// A store that is never written to disk
    pub fn ephemeral(clock: Arc<dyn Clock>) -> Self {
        Self {
            path: None,
            clock,
            entries: Mutex::new(Table::new()),
        }
    }

    /// Snapshot location
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read a value; expired entries read as absent and are purged
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock();
        let now = self.clock.now_millis();

        match entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => {}
        }

        entries.remove(key);
        debug!("Purged expired key {}", key);
        if let Err(e) = self.persist(&entries) {
            warn!("Failed to persist purge of {}: {}", key, e);
        }
        None
    }

    /// Read a value and decode it; a value of the wrong shape reads as absent
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Value under {} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Whether a live entry exists under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite a value, durably
    ///
    /// With a `ttl` the entry expires at `now + ttl`. If the snapshot cannot
    /// be written the in-memory table is rolled back and the error returned.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let value = serde_json::to_value(value).map_err(StoreError::SerializeError)?;
        let mut entries = self.entries.lock();
        let expires_at = ttl.map(|ttl| self.clock.now_millis().saturating_add(ttl.as_millis() as u64));

        let previous = entries.insert(key.to_string(), StoredEntry { value, expires_at });
        if let Err(e) = self.persist(&entries) {
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove a value, durably; removing an absent key is a no-op
    pub fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&entries) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let mut entries = self.entries.lock();
        let now = self.clock.now_millis();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();

        if purged > 0 {
            self.persist(&entries)?;
            info!("Purged {} expired entries", purged);
        }
        Ok(purged)
    }

    /// Live entries in key order
    pub fn snapshot(&self) -> Vec<(String, StoredEntry)> {
        let entries = self.entries.lock();
        let now = self.clock.now_millis();
        entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let entries = self.entries.lock();
        let now = self.clock.now_millis();
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the full table to a temp file and rename it over the snapshot
    fn persist(&self, entries: &Table) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(StoreError::WriteError)?;
            }
        }

        let content = serde_json::to_vec_pretty(entries).map_err(StoreError::SerializeError)?;
        let tmp = sibling(path, "tmp");
        {
            let mut file = File::create(&tmp).map_err(StoreError::WriteError)?;
            file.write_all(&content).map_err(StoreError::WriteError)?;
            file.sync_all().map_err(StoreError::WriteError)?;
        }
        fs::rename(&tmp, path).map_err(StoreError::WriteError)?;
        Ok(())
    }
}

impl std::fmt::Debug for TtlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlStore")
            .field("path", &self.path)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

/// `bot_data.json` -> `bot_data.json.<ext>`
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(ext);
    path.with_file_name(name)
}

fn load_snapshot(path: &Path) -> Table {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Table::new(),
        Err(e) => {
            warn!("Cannot read store {:?}, starting empty: {}", path, e);
            return Table::new();
        }
    };

    match serde_json::from_slice(&content) {
        Ok(entries) => entries,
        Err(e) => {
            let aside = sibling(path, "corrupt");
            warn!("Store {:?} is malformed, moving it to {:?} and starting empty: {}", path, aside, e);
            if let Err(e) = fs::rename(path, &aside) {
                warn!("Failed to move malformed store aside: {}", e);
            }
            Table::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir, clock: &ManualClock) -> TtlStore {
        TtlStore::open_with_clock(dir.path().join("bot_data.json"), Arc::new(clock.clone()))
    }

    #[test]
    fn test_put_and_get() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let store = store_in(&dir, &clock);

        store.put("verify-42", "7", None).unwrap();

        assert_eq!(store.get_as::<String>("verify-42"), Some("7".to_string()));
        assert!(store.contains("verify-42"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_entry() {
        let store = TtlStore::ephemeral(Arc::new(ManualClock::default()));
        assert_eq!(store.get("nothing"), None);
        assert!(!store.contains("nothing"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_overwrite() {
        let store = TtlStore::ephemeral(Arc::new(ManualClock::default()));
        store.put("isblocked-1", &true, None).unwrap();
        store.put("isblocked-1", &false, None).unwrap();
        assert_eq!(store.get_as::<bool>("isblocked-1"), Some(false));
    }

    #[test]
    fn test_expiry_boundary() {
        let clock = ManualClock::new(0);
        let store = TtlStore::ephemeral(Arc::new(clock.clone()));
        store.put("msg-map-555", "42", Some(Duration::from_secs(10))).unwrap();

        clock.advance(Duration::from_secs(10));
        assert_eq!(store.get_as::<String>("msg-map-555"), Some("42".to_string()));

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.get("msg-map-555"), None);
    }

    #[test]
    fn test_expired_read_purges_file() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(0);
        let store = store_in(&dir, &clock);
        store.put("verified-42", &true, Some(Duration::from_secs(1))).unwrap();
        store.put("isblocked-42", &true, None).unwrap();

        clock.advance(Duration::from_secs(2));
        assert_eq!(store.get("verified-42"), None);

        let reopened = store_in(&dir, &clock);
        assert_eq!(reopened.snapshot().len(), 1);
        assert!(reopened.contains("isblocked-42"));
    }

    #[test]
    fn test_delete() {
        let store = TtlStore::ephemeral(Arc::new(ManualClock::default()));
        store.put("verify-42", "7", None).unwrap();
        store.delete("verify-42").unwrap();
        assert!(!store.contains("verify-42"));
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let store = store_in(&dir, &clock);

        store.delete("never-set").unwrap();
        // Nothing was written
        assert!(!dir.path().join("bot_data.json").exists());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        {
            let store = store_in(&dir, &clock);
            store.put("msg-map-555", "42", Some(Duration::from_secs(60))).unwrap();
            store.put("isblocked-42", &true, None).unwrap();
        }

        let store = store_in(&dir, &clock);
        assert_eq!(store.get_as::<String>("msg-map-555"), Some("42".to_string()));
        assert_eq!(store.get_as::<bool>("isblocked-42"), Some(true));
    }

    #[test]
    fn test_snapshot_format_is_human_readable() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(1_000);
        let store = store_in(&dir, &clock);
        store.put("verified-42", &true, Some(Duration::from_secs(1))).unwrap();
        store.put("verify-43", "12", None).unwrap();

        let raw = fs::read_to_string(dir.path().join("bot_data.json")).unwrap();
        let json: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["verified-42"]["value"], true);
        assert_eq!(json["verified-42"]["expiresAt"], 2_000);
        assert_eq!(json["verify-43"]["value"], "12");
        assert!(json["verify-43"]["expiresAt"].is_null());
        // Pretty-printed
        assert!(raw.contains('\n'));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let store = store_in(&dir, &clock);
        store.put("a", "b", None).unwrap();
        assert!(!dir.path().join("bot_data.json.tmp").exists());
    }

    #[test]
    fn test_purge_expired() {
        let clock = ManualClock::new(0);
        let store = TtlStore::ephemeral(Arc::new(clock.clone()));
        store.put("a", "1", Some(Duration::from_secs(1))).unwrap();
        store.put("b", "2", Some(Duration::from_secs(100))).unwrap();
        store.put("c", "3", None).unwrap();

        clock.advance(Duration::from_secs(5));
        assert_eq!(store.len(), 2);
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.purge_expired().unwrap(), 0);

        let keys: Vec<String> = store.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_put_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = TtlStore::open_with_clock(&path, Arc::new(ManualClock::default()));
        store.put("k", "v", None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_concurrent_writers_keep_file_valid() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::default();
        let store = Arc::new(store_in(&dir, &clock));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..20 {
                        store.put(&format!("k-{}-{}", t, i), &i, None).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let raw = fs::read_to_string(dir.path().join("bot_data.json")).unwrap();
        let parsed: Table = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 160);
    }

    // ==================== NEGATIVE TESTS ====================

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_data.json");
        fs::write(&path, "{ not json").unwrap();

        let store = TtlStore::open_with_clock(&path, Arc::new(ManualClock::default()));
        assert!(store.is_empty());
        assert!(dir.path().join("bot_data.json.corrupt").exists());

        // And is usable afterwards
        store.put("k", "v", None).unwrap();
        assert!(store.contains("k"));
    }

    #[test]
    fn test_wrong_shape_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_data.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = TtlStore::open_with_clock(&path, Arc::new(ManualClock::default()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_as_wrong_type_reads_absent() {
        let store = TtlStore::ephemeral(Arc::new(ManualClock::default()));
        store.put("isblocked-1", "yes", None).unwrap();
        assert_eq!(store.get_as::<bool>("isblocked-1"), None);
        // Raw value still present
        assert!(store.contains("isblocked-1"));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        // The snapshot path is a directory, so the rename fails
        let path = dir.path().join("snapshot");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupant"), "x").unwrap();

        let store = TtlStore::open_with_clock(&path, Arc::new(ManualClock::default()));
        assert!(store.put("k", "v", None).is_err());
        assert!(!store.contains("k"));
    }

    #[test]
    fn test_entry_without_expiry_field_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_data.json");
        fs::write(&path, r#"{"isblocked-9": {"value": true}}"#).unwrap();

        let store = TtlStore::open_with_clock(&path, Arc::new(ManualClock::default()));
        assert_eq!(store.get_as::<bool>("isblocked-9"), Some(true));
    }
}
