//! Resource cache shared by all workers.
//!
//! [`CacheStore`] is the contract the engine consumes. [`ResourceCache`] is
//! the on-disk implementation: a versioned JSON index plus one folder per
//! media kind.
//!
//! ```text
//! <cache_dir>/
//!   index.json
//!   cover/<record id>-<source>.png
//!   screenshot/...
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use scrapyard_core::{
    CacheRecordId, FieldKind, FieldValue, FileDescriptor, Media, ResolvedRecord,
};

use crate::decision::CACHE_SOURCE;
use crate::error::EngineError;
use crate::report::FileReport;
use crate::settings::EngineConfig;

/// Storage collaborator used by the engine. Implementations serialise
/// access internally; all methods take `&self`.
pub trait CacheStore: Send + Sync {
    /// Anything stored for the file, from `source` or from any source.
    fn has_entries(&self, id: &CacheRecordId, source: Option<&str>) -> bool;

    /// Anything beyond a title stored for the file. With `offline_only`,
    /// resources that are only remote URLs do not count.
    fn has_meaningful_entries(
        &self,
        id: &CacheRecordId,
        source: Option<&str>,
        offline_only: bool,
    ) -> bool;

    /// Any source stored a field of this kind for the file.
    fn has_entries_of_type(&self, id: &CacheRecordId, kind: FieldKind) -> bool;

    /// Share (0-100) of `expected` kinds stored by `source`.
    fn completeness(&self, id: &CacheRecordId, source: &str, expected: &[FieldKind]) -> u8;

    /// Copy stored fields the record lacks into it. Returns how many.
    fn fill_blanks(
        &self,
        id: &CacheRecordId,
        record: &mut ResolvedRecord,
        source: Option<&str>,
    ) -> usize;

    /// Store every cacheable field of a resolved record.
    fn add_resources(
        &self,
        id: &CacheRecordId,
        record: &ResolvedRecord,
        config: &EngineConfig,
        report: &mut FileReport,
    ) -> Result<(), EngineError>;

    /// Drop everything `source` stored for the file. Returns how many
    /// resources were removed.
    fn remove_resources(&self, id: &CacheRecordId, source: &str) -> Result<usize, EngineError>;

    /// Memoised record id for a file whose size and mtime are unchanged.
    fn get_quick_id(&self, file: &FileDescriptor) -> Option<CacheRecordId>;

    fn add_quick_id(&self, file: &FileDescriptor, id: &CacheRecordId);

    /// Remember that `source` found no acceptable match for the file.
    fn mark_unmatched(&self, id: &CacheRecordId, source: &str);

    fn is_unmatched(&self, id: &CacheRecordId, source: &str) -> bool;

    /// Everything stored for the file, merged across sources.
    fn load_record(&self, id: &CacheRecordId, platform: &str) -> Option<ResolvedRecord>;

    /// Persist pending changes.
    fn flush(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

const INDEX_FILE: &str = "index.json";

/// Bump when the index layout changes; older indexes are discarded.
const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredResource {
    kind: FieldKind,
    source: String,
    value: FieldValue,
    /// RFC 3339 timestamp
    stored_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CachedEntry {
    platform: String,
    resources: Vec<StoredResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuickId {
    size: u64,
    modified: u64,
    id: CacheRecordId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheIndex {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<CacheRecordId, CachedEntry>,
    /// Keyed by canonical path
    #[serde(default)]
    quick_ids: BTreeMap<String, QuickId>,
    /// Sources that found no match, per record
    #[serde(default)]
    unmatched: BTreeMap<CacheRecordId, BTreeSet<String>>,
}

impl Default for CacheIndex {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            entries: BTreeMap::new(),
            quick_ids: BTreeMap::new(),
            unmatched: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct IndexState {
    index: CacheIndex,
    dirty: bool,
}

/// Summary for `scrapyard cache stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub records: usize,
    pub resources: usize,
    /// Resource count per source
    pub per_source: BTreeMap<String, usize>,
    pub unmatched: usize,
    pub quick_ids: usize,
    /// Bytes on disk, index included
    pub disk_bytes: u64,
}

/// JSON-indexed cache rooted at one directory (one per platform).
#[derive(Debug)]
pub struct ResourceCache {
    root: PathBuf,
    state: Mutex<IndexState>,
}

impl ResourceCache {
    /// Open the cache at `root`, creating it if needed. An index written by
    /// an incompatible version is discarded.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let index = load_index(&root.join(INDEX_FILE))?;
        log::debug!(
            "Opened cache at {} ({} records)",
            root.display(),
            index.entries.len()
        );
        Ok(Self {
            root,
            state: Mutex::new(IndexState { index, dirty: false }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let index = &state.index;
        let mut stats = CacheStats {
            records: index.entries.len(),
            unmatched: index.unmatched.len(),
            quick_ids: index.quick_ids.len(),
            ..Default::default()
        };
        for entry in index.entries.values() {
            stats.resources += entry.resources.len();
            for res in &entry.resources {
                *stats.per_source.entry(res.source.clone()).or_default() += 1;
            }
        }
        drop(state);
        stats.disk_bytes = dir_size(&self.root);
        stats
    }

    /// Drop everything one source stored, across all records.
    pub fn clear_source(&self, source: &str) -> Result<usize, EngineError> {
        let ids: Vec<CacheRecordId> = self.lock().index.entries.keys().cloned().collect();
        let mut removed = 0;
        for id in ids {
            removed += self.remove_resources(&id, source)?;
        }
        let mut state = self.lock();
        for sources in state.index.unmatched.values_mut() {
            sources.remove(source);
        }
        state.index.unmatched.retain(|_, s| !s.is_empty());
        state.dirty = true;
        Ok(removed)
    }

    /// Target path of a media resource stored in the cache.
    fn media_path(&self, id: &CacheRecordId, kind: FieldKind, source: &str, ext: &str) -> PathBuf {
        self.root
            .join(kind.name())
            .join(format!("{}-{}.{}", id, source, ext))
    }

    /// Bring a media value into the cache. Remote URLs stay remote.
    fn store_media(
        &self,
        id: &CacheRecordId,
        kind: FieldKind,
        source: &str,
        media: &Media,
    ) -> io::Result<Media> {
        match media {
            Media::Data { bytes, extension } => {
                let ext = if extension.is_empty() {
                    kind.default_extension()
                } else {
                    extension.as_str()
                };
                let target = self.media_path(id, kind, source, ext);
                write_atomic(&target, bytes)?;
                Ok(Media::File(target))
            }
            Media::File(path) => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or(kind.default_extension());
                let target = self.media_path(id, kind, source, ext);
                if *path != target {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::copy(path, &target)?;
                }
                Ok(Media::File(target))
            }
            Media::Url(url) => Ok(Media::Url(url.clone())),
        }
    }
}

impl CacheStore for ResourceCache {
    fn has_entries(&self, id: &CacheRecordId, source: Option<&str>) -> bool {
        let state = self.lock();
        state.index.entries.get(id).is_some_and(|entry| {
            entry
                .resources
                .iter()
                .any(|r| source.is_none_or(|s| r.source == s))
        })
    }

    fn has_meaningful_entries(
        &self,
        id: &CacheRecordId,
        source: Option<&str>,
        offline_only: bool,
    ) -> bool {
        let state = self.lock();
        state.index.entries.get(id).is_some_and(|entry| {
            entry.resources.iter().any(|r| {
                r.kind != FieldKind::Title
                    && source.is_none_or(|s| r.source == s)
                    && !(offline_only && matches!(r.value, FieldValue::Media(Media::Url(_))))
            })
        })
    }

    fn has_entries_of_type(&self, id: &CacheRecordId, kind: FieldKind) -> bool {
        let state = self.lock();
        state
            .index
            .entries
            .get(id)
            .is_some_and(|entry| entry.resources.iter().any(|r| r.kind == kind))
    }

    fn completeness(&self, id: &CacheRecordId, source: &str, expected: &[FieldKind]) -> u8 {
        if expected.is_empty() {
            return 100;
        }
        let state = self.lock();
        let Some(entry) = state.index.entries.get(id) else {
            return 0;
        };
        let stored: BTreeSet<FieldKind> = entry
            .resources
            .iter()
            .filter(|r| r.source == source)
            .map(|r| r.kind)
            .collect();
        let present = expected.iter().filter(|k| stored.contains(k)).count();
        ((present * 100) / expected.len()) as u8
    }

    fn fill_blanks(
        &self,
        id: &CacheRecordId,
        record: &mut ResolvedRecord,
        source: Option<&str>,
    ) -> usize {
        let state = self.lock();
        let Some(entry) = state.index.entries.get(id) else {
            return 0;
        };
        let mut filled = 0;
        for res in &entry.resources {
            if source.is_some_and(|s| res.source != s) || record.has(res.kind) {
                continue;
            }
            if record.set(res.kind, res.value.clone(), res.source.clone()) {
                filled += 1;
            }
        }
        filled
    }

    fn add_resources(
        &self,
        id: &CacheRecordId,
        record: &ResolvedRecord,
        config: &EngineConfig,
        report: &mut FileReport,
    ) -> Result<(), EngineError> {
        let stored_at = chrono::Utc::now().to_rfc3339();
        let mut incoming = Vec::new();
        for (kind, field) in record.fields() {
            if !config.caches(kind) {
                continue;
            }
            let value = match &field.value {
                FieldValue::Media(media) => {
                    match self.store_media(id, kind, &field.source, media) {
                        Ok(stored) => FieldValue::Media(stored),
                        Err(e) => {
                            report.warn(format!("{}: could not store in cache: {}", kind, e));
                            continue;
                        }
                    }
                }
                other => other.clone(),
            };
            incoming.push(StoredResource {
                kind,
                source: field.source.clone(),
                value,
                stored_at: stored_at.clone(),
            });
        }

        let mut state = self.lock();
        let entry = state.index.entries.entry(id.clone()).or_default();
        entry.platform = record.platform.clone();
        let added = incoming.len();
        for res in incoming {
            entry
                .resources
                .retain(|r| !(r.kind == res.kind && r.source == res.source));
            entry.resources.push(res);
        }
        if entry.resources.is_empty() {
            state.index.entries.remove(id);
        }
        if let Some(sources) = state.index.unmatched.get_mut(id) {
            sources.remove(&record.source);
            if sources.is_empty() {
                state.index.unmatched.remove(id);
            }
        }
        state.dirty = true;
        log::debug!("Cached {} resources for {}", added, id);
        Ok(())
    }

    fn remove_resources(&self, id: &CacheRecordId, source: &str) -> Result<usize, EngineError> {
        let mut removed_files = Vec::new();
        let removed = {
            let mut state = self.lock();
            let Some(entry) = state.index.entries.get_mut(id) else {
                return Ok(0);
            };
            let before = entry.resources.len();
            entry.resources.retain(|r| {
                if r.source != source {
                    return true;
                }
                if let FieldValue::Media(Media::File(path)) = &r.value {
                    removed_files.push(path.clone());
                }
                false
            });
            let removed = before - entry.resources.len();
            if entry.resources.is_empty() {
                state.index.entries.remove(id);
            }
            if removed > 0 {
                state.dirty = true;
            }
            removed
        };

        for path in removed_files {
            if !path.starts_with(&self.root) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(EngineError::cache(format!(
                        "Failed to remove {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
        Ok(removed)
    }

    fn get_quick_id(&self, file: &FileDescriptor) -> Option<CacheRecordId> {
        let (size, modified) = file_stamp(file.path())?;
        let key = quick_id_key(file);
        let state = self.lock();
        state
            .index
            .quick_ids
            .get(&key)
            .filter(|q| q.size == size && q.modified == modified)
            .map(|q| q.id.clone())
    }

    fn add_quick_id(&self, file: &FileDescriptor, id: &CacheRecordId) {
        let Some((size, modified)) = file_stamp(file.path()) else {
            return;
        };
        let mut state = self.lock();
        state.index.quick_ids.insert(
            quick_id_key(file),
            QuickId {
                size,
                modified,
                id: id.clone(),
            },
        );
        state.dirty = true;
    }

    fn mark_unmatched(&self, id: &CacheRecordId, source: &str) {
        let mut state = self.lock();
        let inserted = state
            .index
            .unmatched
            .entry(id.clone())
            .or_default()
            .insert(source.to_string());
        if inserted {
            state.dirty = true;
        }
    }

    fn is_unmatched(&self, id: &CacheRecordId, source: &str) -> bool {
        let state = self.lock();
        state
            .index
            .unmatched
            .get(id)
            .is_some_and(|sources| sources.contains(source))
    }

    fn load_record(&self, id: &CacheRecordId, platform: &str) -> Option<ResolvedRecord> {
        if !self.has_entries(id, None) {
            return None;
        }
        let mut record = ResolvedRecord::new(platform, CACHE_SOURCE);
        self.fill_blanks(id, &mut record, None);
        record.found = true;
        record.search_match = 100;
        Some(record)
    }

    fn flush(&self) -> Result<(), EngineError> {
        let mut state = self.lock();
        if !state.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&state.index)
            .map_err(|e| EngineError::cache(format!("Failed to serialize index: {}", e)))?;
        write_atomic(&self.root.join(INDEX_FILE), json.as_bytes())?;
        state.dirty = false;
        Ok(())
    }
}

impl Drop for ResourceCache {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("Failed to save cache index: {}", e);
        }
    }
}

/// Load the index. A missing file or a version mismatch yields an empty one.
fn load_index(path: &Path) -> Result<CacheIndex, EngineError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheIndex::default()),
        Err(e) => return Err(e.into()),
    };
    let index: CacheIndex = serde_json::from_str(&contents)
        .map_err(|e| EngineError::cache(format!("{}: {}", path.display(), e)))?;
    if index.version != INDEX_VERSION {
        log::warn!(
            "Cache index version {} does not match {}, starting fresh",
            index.version,
            INDEX_VERSION
        );
        return Ok(CacheIndex::default());
    }
    Ok(index)
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}

fn quick_id_key(file: &FileDescriptor) -> String {
    file.canonical_path().to_string_lossy().into_owned()
}

/// File size and modification time in seconds since the epoch.
fn file_stamp(path: &Path) -> Option<(u64, u64)> {
    let meta = fs::metadata(path).ok()?;
    let modified = meta
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_secs();
    Some((meta.len(), modified))
}

fn dir_size(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let mut total = 0u64;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            total += dir_size(&path);
        } else if let Ok(meta) = fs::metadata(&path) {
            total += meta.len();
        }
    }
    total
}

/// Delete the cache directory. Returns the number of bytes freed.
pub fn clear(root: &Path) -> Result<u64, EngineError> {
    if !root.exists() {
        return Ok(0);
    }
    let total = dir_size(root);
    fs::remove_dir_all(root)?;
    Ok(total)
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
