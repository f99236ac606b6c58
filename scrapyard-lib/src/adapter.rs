//! The source adapter contract.
//!
//! Every metadata source (web API, import folder, the cache itself) is a
//! [`SourceAdapter`]. The engine owns one instance per worker and drives it
//! through the same protocol:
//!
//! 1. [`run_passes`](SourceAdapter::run_passes) tries each search name until
//!    a pass yields candidates.
//! 2. The engine picks a candidate (see [`crate::matching`]).
//! 3. [`get_game_data`](SourceAdapter::get_game_data) fetches each field in
//!    [`fetch_order`](SourceAdapter::fetch_order).
//!
//! Adapters track their own request budget in a [`QuotaState`]. Once a
//! bounded budget reaches zero the instance refuses further remote calls.

use std::collections::HashSet;

use async_trait::async_trait;

use scrapyard_core::{CandidateEntry, FieldKind, FileDescriptor, QuotaState, ResolvedRecord};

use crate::decision::CACHE_SOURCE;
use crate::error::AdapterError;
use crate::names::{self, NamingOptions};
use crate::report::FileReport;

#[async_trait]
pub trait SourceAdapter: Send {
    /// Source name recorded as provenance ("screenscraper", "import", ...).
    fn name(&self) -> &str;

    fn naming(&self) -> &NamingOptions;

    /// Fields this source can provide, in fetch order.
    fn fetch_order(&self) -> &[FieldKind];

    /// Current request budget. Updated by the adapter after remote calls.
    fn quota(&self) -> QuotaState;

    /// Whether an update may fetch only the fields the cache lacks.
    fn supports_incremental(&self) -> bool {
        false
    }

    /// Queries for a file, highest priority first.
    fn search_names(&self, file: &FileDescriptor) -> Vec<String> {
        names::search_names(file.base_name(), self.naming())
    }

    /// Title the candidates are scored against.
    fn compare_title(&self, file: &FileDescriptor) -> String {
        names::compare_title(file.base_name(), self.naming())
    }

    /// One search pass. An empty result moves on to the next name.
    async fn search(
        &mut self,
        query: &str,
        file: &FileDescriptor,
    ) -> Result<Vec<CandidateEntry>, AdapterError>;

    /// Run search passes until one yields candidates. Names come from
    /// `search_file`; lookups that need the file itself use
    /// `original_file`. Returns the 1-based pass that produced candidates.
    async fn run_passes(
        &mut self,
        candidates: &mut Vec<CandidateEntry>,
        search_file: &FileDescriptor,
        original_file: &FileDescriptor,
        report: &mut FileReport,
    ) -> Result<Option<usize>, AdapterError> {
        run_search_passes(self, candidates, search_file, original_file, report).await
    }

    /// Fetch one field into the record. `Ok(false)` means the source has
    /// nothing for it.
    async fn fetch_field(
        &mut self,
        kind: FieldKind,
        candidate: &CandidateEntry,
        record: &mut ResolvedRecord,
    ) -> Result<bool, AdapterError>;

    /// Fetch every field in [`fetch_order`](Self::fetch_order).
    ///
    /// Media kinds in `shared_hints` are skipped. With `cached`, fields the
    /// cached record already holds are skipped too. Returns warnings for
    /// fields that failed without making the adapter unusable.
    async fn get_game_data(
        &mut self,
        candidate: &CandidateEntry,
        record: &mut ResolvedRecord,
        shared_hints: &HashSet<FieldKind>,
        cached: Option<&ResolvedRecord>,
    ) -> Result<Vec<String>, AdapterError> {
        fetch_game_data(self, candidate, record, shared_hints, cached).await
    }
}

/// The default pass loop behind [`SourceAdapter::run_passes`].
pub async fn run_search_passes<A: SourceAdapter + ?Sized>(
    adapter: &mut A,
    candidates: &mut Vec<CandidateEntry>,
    search_file: &FileDescriptor,
    original_file: &FileDescriptor,
    report: &mut FileReport,
) -> Result<Option<usize>, AdapterError> {
    let queries = adapter.search_names(search_file);
    for (i, query) in queries.iter().enumerate() {
        let pass = i + 1;
        if adapter.quota().is_exhausted() {
            return Err(AdapterError::QuotaExhausted);
        }
        match adapter.search(query, original_file).await {
            Ok(found) if !found.is_empty() => {
                report.line(format!(
                    "Pass {} '{}': {} candidate(s)",
                    pass,
                    query,
                    found.len()
                ));
                candidates.extend(found);
                return Ok(Some(pass));
            }
            Ok(_) => {
                log::debug!("{}: pass {} '{}' found nothing", adapter.name(), pass, query);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => report.warn(format!("Pass {} '{}': {}", pass, query, e)),
        }
    }
    Ok(None)
}

/// The default fetch loop behind [`SourceAdapter::get_game_data`].
pub async fn fetch_game_data<A: SourceAdapter + ?Sized>(
    adapter: &mut A,
    candidate: &CandidateEntry,
    record: &mut ResolvedRecord,
    shared_hints: &HashSet<FieldKind>,
    cached: Option<&ResolvedRecord>,
) -> Result<Vec<String>, AdapterError> {
    let mut warnings = Vec::new();
    let order = adapter.fetch_order().to_vec();
    for kind in order {
        if kind.is_media() && shared_hints.contains(&kind) {
            continue;
        }
        if cached.is_some_and(|c| c.has(kind)) {
            continue;
        }
        if adapter.quota().is_exhausted() {
            warnings.push(format!("Request quota exhausted before fetching {}", kind));
            break;
        }
        match adapter.fetch_field(kind, candidate, record).await {
            Ok(_) | Err(AdapterError::Unavailable(_)) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warnings.push(format!("{}: {}", kind, e)),
        }
    }
    Ok(warnings)
}

/// Interactive candidate selection. `suggested` is the best automatic
/// match, if any; returning `None` rejects every candidate.
///
/// Returning `suggested` keeps its automatic score, so it is still checked
/// against the minimum match. `choose` is called from a runtime thread and
/// may block.
pub trait CandidateChooser: Send + Sync {
    fn choose(
        &self,
        file: &FileDescriptor,
        candidates: &[CandidateEntry],
        suggested: Option<usize>,
    ) -> Option<usize>;
}

/// Adapter for workers that only serve stored records. It never searches.
#[derive(Debug, Default)]
pub struct CacheSource {
    naming: NamingOptions,
}

impl CacheSource {
    pub fn new(naming: NamingOptions) -> Self {
        Self { naming }
    }
}

#[async_trait]
impl SourceAdapter for CacheSource {
    fn name(&self) -> &str {
        CACHE_SOURCE
    }

    fn naming(&self) -> &NamingOptions {
        &self.naming
    }

    fn fetch_order(&self) -> &[FieldKind] {
        &[]
    }

    fn quota(&self) -> QuotaState {
        QuotaState::unlimited()
    }

    async fn search(
        &mut self,
        _query: &str,
        _file: &FileDescriptor,
    ) -> Result<Vec<CandidateEntry>, AdapterError> {
        Ok(Vec::new())
    }

    async fn fetch_field(
        &mut self,
        kind: FieldKind,
        _candidate: &CandidateEntry,
        _record: &mut ResolvedRecord,
    ) -> Result<bool, AdapterError> {
        Err(AdapterError::Unavailable(kind))
    }
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
