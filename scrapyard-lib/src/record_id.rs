//! Cache record ids.

use scrapyard_core::{CacheRecordId, FileDescriptor};

use crate::cache::CacheStore;
use crate::error::EngineError;
use crate::hasher;
use crate::settings::IdMode;

/// Record id for `file`, computed once and memoised in the cache's
/// quick-id table.
pub fn resolve(
    file: &FileDescriptor,
    cache: &dyn CacheStore,
    mode: IdMode,
) -> Result<CacheRecordId, EngineError> {
    if let Some(id) = cache.get_quick_id(file) {
        return Ok(id);
    }
    let id = compute(file, mode)?;
    cache.add_quick_id(file, &id);
    Ok(id)
}

/// Compute the id without consulting the cache.
pub fn compute(file: &FileDescriptor, mode: IdMode) -> Result<CacheRecordId, EngineError> {
    let digest = match mode {
        IdMode::Content => hasher::sha1_file(file.path())?,
        IdMode::Path => hasher::sha1_str(&file.canonical_path().to_string_lossy()),
    };
    Ok(CacheRecordId::new(digest))
}
