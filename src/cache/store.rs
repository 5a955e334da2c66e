//! Cache store implementations

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::highlights::{Highlight, HighlightRecord};

const ENTRY_PREFIX: &str = "highlights-";
const ENTRY_SUFFIX: &str = ".json";
const BACKUP_FILE: &str = "last-owner.json";

/// Key-value snapshot store parameterized by owner id.
///
/// Cache operations never suspend and never fail; migration relies on the
/// scan-all-owners path when highlights were written under a now-stale key.
pub trait CacheStore: Send + Sync {
    /// Load the snapshot for one owner. Empty on any failure.
    fn load(&self, owner_id: &str) -> Vec<Highlight>;

    /// Replace the snapshot for one owner. No-op on failure.
    fn save(&self, owner_id: &str, highlights: &[Highlight]);

    /// Scan every owner entry, in no particular owner order.
    fn load_all_owners(&self) -> Vec<Highlight>;

    /// Write the longer-lived "last known owner" backup record.
    fn save_backup(&self, owner_id: &str, highlights: &[Highlight]);

    /// Read the backup record, if one was ever written.
    fn load_backup(&self) -> Option<OwnerBackup>;
}

/// Snapshot preserved across sign-out so a guest view on the same device can
/// still show historical data read-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerBackup {
    pub owner_id: String,
    pub highlights: Vec<HighlightRecord>,
    pub saved_at: DateTime<Utc>,
}

impl OwnerBackup {
    pub fn into_highlights(self) -> Vec<Highlight> {
        self.highlights
            .into_iter()
            .filter_map(HighlightRecord::into_highlight)
            .collect()
    }
}

fn to_records(highlights: &[Highlight]) -> Vec<HighlightRecord> {
    highlights.iter().map(HighlightRecord::from_highlight).collect()
}

fn from_records(records: Vec<HighlightRecord>) -> Vec<Highlight> {
    records
        .into_iter()
        .filter_map(HighlightRecord::into_highlight)
        .collect()
}

/// One JSON snapshot file per owner under a namespaced directory
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(err) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), %err, "cannot create cache directory; cache is disabled");
        }
        Self { dir }
    }

    fn entry_path(&self, owner_id: &str) -> PathBuf {
        // Owner ids are caller-supplied; encode them so they are always a
        // single safe path component.
        let encoded = urlencoding::encode(owner_id);
        self.dir
            .join(format!("{ENTRY_PREFIX}{encoded}{ENTRY_SUFFIX}"))
    }

    fn read_entry(path: &Path) -> Vec<Highlight> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str::<Vec<HighlightRecord>>(&raw) {
            Ok(records) => from_records(records),
            Err(err) => {
                // A malformed entry is discarded whole rather than partially
                // trusted.
                warn!(path = %path.display(), %err, "discarding malformed cache entry");
                Vec::new()
            }
        }
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                warn!(%err, "cannot serialize cache entry");
                return;
            }
        };
        if let Err(err) = fs::write(path, json) {
            warn!(path = %path.display(), %err, "cache write failed; in-memory state remains correct");
        }
    }
}

impl CacheStore for JsonFileCache {
    fn load(&self, owner_id: &str) -> Vec<Highlight> {
        Self::read_entry(&self.entry_path(owner_id))
    }

    fn save(&self, owner_id: &str, highlights: &[Highlight]) {
        self.write_json(&self.entry_path(owner_id), &to_records(highlights));
    }

    fn load_all_owners(&self) -> Vec<Highlight> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut out = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(ENTRY_PREFIX) && name.ends_with(ENTRY_SUFFIX) {
                out.extend(Self::read_entry(&entry.path()));
            }
        }
        out
    }

    fn save_backup(&self, owner_id: &str, highlights: &[Highlight]) {
        let backup = OwnerBackup {
            owner_id: owner_id.to_string(),
            highlights: to_records(highlights),
            saved_at: Utc::now(),
        };
        self.write_json(&self.dir.join(BACKUP_FILE), &backup);
    }

    fn load_backup(&self) -> Option<OwnerBackup> {
        let raw = fs::read_to_string(self.dir.join(BACKUP_FILE)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(backup) => Some(backup),
            Err(err) => {
                warn!(%err, "discarding malformed backup record");
                None
            }
        }
    }
}

/// In-memory cache for tests and embedded use
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Vec<HighlightRecord>>>,
    backup: RwLock<Option<OwnerBackup>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn load(&self, owner_id: &str) -> Vec<Highlight> {
        self.entries
            .read()
            .get(owner_id)
            .cloned()
            .map(from_records)
            .unwrap_or_default()
    }

    fn save(&self, owner_id: &str, highlights: &[Highlight]) {
        self.entries
            .write()
            .insert(owner_id.to_string(), to_records(highlights));
    }

    fn load_all_owners(&self) -> Vec<Highlight> {
        self.entries
            .read()
            .values()
            .cloned()
            .flat_map(from_records)
            .collect()
    }

    fn save_backup(&self, owner_id: &str, highlights: &[Highlight]) {
        *self.backup.write() = Some(OwnerBackup {
            owner_id: owner_id.to_string(),
            highlights: to_records(highlights),
            saved_at: Utc::now(),
        });
    }

    fn load_backup(&self) -> Option<OwnerBackup> {
        self.backup.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlights::PageRef;

    fn highlight(owner: &str, text: &str) -> Highlight {
        Highlight::new_local(owner, PageRef::topic("intro"), text, 0, "", "")
    }

    #[test]
    fn test_file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path());

        let highlights = vec![highlight("owner-1", "brown fox"), highlight("owner-1", "lazy dog")];
        cache.save("owner-1", &highlights);

        assert_eq!(cache.load("owner-1"), highlights);
        assert!(cache.load("owner-2").is_empty());
    }

    #[test]
    fn test_file_cache_corrupt_entry_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path());
        cache.save("owner-1", &[highlight("owner-1", "brown fox")]);

        let path = cache.entry_path("owner-1");
        std::fs::write(&path, "{not json").unwrap();
        assert!(cache.load("owner-1").is_empty());
    }

    #[test]
    fn test_file_cache_drops_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path());

        let good = highlight("owner-1", "brown fox");
        let mut records = to_records(&[good.clone(), highlight("owner-1", "lazy dog")]);
        records[1].text = String::new();
        let path = cache.entry_path("owner-1");
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        assert_eq!(cache.load("owner-1"), vec![good]);
    }

    #[test]
    fn test_file_cache_scan_all_owners() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path());
        cache.save("anon-1", &[highlight("anon-1", "brown fox")]);
        cache.save("anon-2", &[highlight("anon-2", "lazy dog")]);

        let all = cache.load_all_owners();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_file_cache_owner_id_is_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path());
        let owner = "weird/../owner id";
        cache.save(owner, &[highlight(owner, "brown fox")]);

        assert_eq!(cache.load(owner).len(), 1);
        // The entry stayed inside the cache directory.
        assert_eq!(cache.load_all_owners().len(), 1);
    }

    #[test]
    fn test_backup_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path());
        cache.save_backup("user-42", &[highlight("user-42", "brown fox")]);

        let backup = cache.load_backup().unwrap();
        assert_eq!(backup.owner_id, "user-42");
        assert_eq!(backup.into_highlights().len(), 1);
        // The backup is not part of the per-owner scan.
        assert!(cache.load_all_owners().is_empty());
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryCache::new();
        cache.save("owner-1", &[highlight("owner-1", "brown fox")]);
        assert_eq!(cache.load("owner-1").len(), 1);
        assert!(cache.load("missing").is_empty());
        assert_eq!(cache.load_all_owners().len(), 1);
        assert!(cache.load_backup().is_none());
    }
}
