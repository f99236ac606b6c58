use std::path::PathBuf;

use scrapyard_core::ResolvedRecord;

use crate::error::EngineError;

/// Renders export artwork for a stored record.
///
/// Invoked only when serving from the cache with export enabled. Returns
/// the written image, or `None` when the record has nothing to compose.
pub trait Compositor: Send + Sync {
    fn compose(
        &self,
        record: &ResolvedRecord,
        base_name: &str,
    ) -> Result<Option<PathBuf>, EngineError>;
}
