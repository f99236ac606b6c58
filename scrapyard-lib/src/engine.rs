//! The per-file worker loop.
//!
//! A [`Worker`] owns one adapter and pulls files from the shared
//! [`WorkQueue`] until the queue drains, its adapter runs out of quota, or
//! a fatal engine error occurs. For every file it resolves the record id,
//! picks an [`Action`] from the decision table and executes it. Progress is
//! reported as [`WorkerEvent`]s; each worker sends exactly one
//! [`WorkerEvent::Finished`].

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Duration;

use scrapyard_core::{
    Action, CacheRecordId, CandidateEntry, FieldKind, FileDescriptor, ResolvedRecord,
};

use crate::adapter::{CandidateChooser, SourceAdapter};
use crate::cache::CacheStore;
use crate::compositor::Compositor;
use crate::decision::{ActionFlags, CacheState, decide_action};
use crate::error::EngineError;
use crate::match_log::{LowMatchEntry, LowMatchLog};
use crate::matching;
use crate::normalize;
use crate::queue::{EntryClaim, WorkQueue};
use crate::record_id;
use crate::report::FileReport;
use crate::settings::EngineConfig;

/// Hard limit per file. Set above the HTTP client's own timeouts and
/// retries so it only fires when something hangs.
pub const SAFETY_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything known about one processed file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub worker: usize,
    pub file: FileDescriptor,
    pub id: Option<CacheRecordId>,
    pub action: Option<Action>,
    pub record: ResolvedRecord,
    pub report: FileReport,
    /// Composited artwork written for export
    pub exported: Option<PathBuf>,
    /// Search pass that produced candidates
    pub pass: Option<usize>,
    /// Title of the best candidate, accepted or not
    pub best_candidate: Option<String>,
    /// Set when the file failed with an error
    pub error: Option<String>,
}

impl FileOutcome {
    fn new(worker: usize, file: FileDescriptor, record: ResolvedRecord) -> Self {
        let report = FileReport::new(file.file_name());
        Self {
            worker,
            file,
            id: None,
            action: None,
            record,
            report,
            exported: None,
            pass: None,
            best_candidate: None,
            error: None,
        }
    }

    fn failed(worker: usize, file: FileDescriptor, platform: &str, source: &str, error: &EngineError) -> Self {
        let mut outcome = Self::new(worker, file, ResolvedRecord::new(platform, source));
        outcome.report.warn(error.to_string());
        outcome.error = Some(error.to_string());
        outcome
    }

    pub fn is_found(&self) -> bool {
        self.record.found
    }

    pub fn is_skipped(&self) -> bool {
        self.record.is_skipped()
    }
}

/// Why a worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// No files left
    QueueDrained,
    /// The adapter's request budget reached zero
    QuotaExhausted,
    /// The adapter was unusable before the first file
    SetupFailed,
    /// An internal error that must not be skipped over
    Fatal(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueueDrained => write!(f, "queue drained"),
            Self::QuotaExhausted => write!(f, "request quota exhausted"),
            Self::SetupFailed => write!(f, "source setup failed"),
            Self::Fatal(msg) => write!(f, "fatal error: {}", msg),
        }
    }
}

#[derive(Debug)]
pub enum WorkerEvent {
    FileStarted {
        worker: usize,
        file: FileDescriptor,
    },
    FileFinished(Box<FileOutcome>),
    Finished {
        worker: usize,
        processed: usize,
        reason: StopReason,
    },
}

/// Collaborators shared by every worker of a run.
#[derive(Clone)]
pub struct EngineContext {
    pub queue: Arc<WorkQueue>,
    pub cache: Arc<dyn CacheStore>,
    pub compositor: Option<Arc<dyn Compositor>>,
    pub chooser: Option<Arc<dyn CandidateChooser>>,
    pub match_log: Option<Arc<LowMatchLog>>,
    pub config: Arc<EngineConfig>,
}

impl EngineContext {
    pub fn new(queue: Arc<WorkQueue>, cache: Arc<dyn CacheStore>, config: Arc<EngineConfig>) -> Self {
        Self {
            queue,
            cache,
            compositor: None,
            chooser: None,
            match_log: None,
            config,
        }
    }

    pub fn with_compositor(mut self, compositor: Arc<dyn Compositor>) -> Self {
        self.compositor = Some(compositor);
        self
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn CandidateChooser>) -> Self {
        self.chooser = Some(chooser);
        self
    }

    pub fn with_match_log(mut self, log: Arc<LowMatchLog>) -> Self {
        self.match_log = Some(log);
        self
    }
}

pub struct Worker {
    index: usize,
    adapter: Box<dyn SourceAdapter>,
    ctx: EngineContext,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl Worker {
    pub fn new(
        index: usize,
        adapter: Box<dyn SourceAdapter>,
        ctx: EngineContext,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Self {
        Self {
            index,
            adapter,
            ctx,
            events,
        }
    }

    /// Process files until the worker has a reason to stop.
    pub async fn run(mut self) -> StopReason {
        let (processed, reason) = self.run_loop().await;
        log::debug!(
            "Worker {} ({}) stopped after {} file(s): {}",
            self.index,
            self.adapter.name(),
            processed,
            reason
        );
        let _ = self.events.send(WorkerEvent::Finished {
            worker: self.index,
            processed,
            reason: reason.clone(),
        });
        reason
    }

    async fn run_loop(&mut self) -> (usize, StopReason) {
        if self.adapter.quota().is_exhausted() {
            log::warn!(
                "{}: no requests available, worker {} not started",
                self.adapter.name(),
                self.index
            );
            return (0, StopReason::SetupFailed);
        }

        let mut processed = 0;
        loop {
            let next = self.ctx.queue.has_entry().and_then(EntryClaim::take_entry);
            let Some(file) = next else {
                return (processed, StopReason::QueueDrained);
            };

            let _ = self.events.send(WorkerEvent::FileStarted {
                worker: self.index,
                file: file.clone(),
            });

            let result = match tokio::time::timeout(SAFETY_TIMEOUT, self.process(&file)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout(SAFETY_TIMEOUT.as_secs())),
            };
            processed += 1;

            let fatal = match result {
                Ok(outcome) => {
                    self.emit(outcome);
                    None
                }
                Err(e) => {
                    log::debug!("{}: {}", file, e);
                    let outcome = FileOutcome::failed(
                        self.index,
                        file,
                        &self.ctx.config.platform,
                        self.adapter.name(),
                        &e,
                    );
                    self.emit(outcome);
                    e.is_fatal().then(|| e.to_string())
                }
            };
            if let Some(msg) = fatal {
                return (processed, StopReason::Fatal(msg));
            }

            if self.adapter.quota().is_exhausted() {
                log::warn!("{}: request quota exhausted, stopping", self.adapter.name());
                return (processed, StopReason::QuotaExhausted);
            }
        }
    }

    fn emit(&self, outcome: FileOutcome) {
        let _ = self.events.send(WorkerEvent::FileFinished(Box::new(outcome)));
    }

    async fn process(&mut self, file: &FileDescriptor) -> Result<FileOutcome, EngineError> {
        let ctx = self.ctx.clone();
        let config = ctx.config.as_ref();
        let cache = ctx.cache.as_ref();
        let source = self.adapter.name().to_string();

        let id = record_id::resolve(file, cache, config.id_mode)?;
        let expected = config.expected_fields();
        let state = CacheState::query(cache, &id, &source, &expected);
        let flags = ActionFlags::from_config(config, &source);
        let action = decide_action(&flags, &state)
            .ok_or_else(|| EngineError::undetermined(file.file_name()))?;

        let mut outcome = FileOutcome::new(
            self.index,
            file.clone(),
            ResolvedRecord::new(&config.platform, &source),
        );
        outcome.id = Some(id.clone());
        outcome.action = Some(action);
        outcome.report.line(format!("Action: {}", action));

        match action {
            Action::Skip(_) => {
                outcome.record = ResolvedRecord::skipped(&config.platform);
            }
            Action::ServeFromCache => {
                self.serve_from_cache(&ctx, &id, &expected, &mut outcome);
            }
            Action::Refresh | Action::Update => {
                self.scrape(&ctx, &id, action, &expected, &mut outcome).await?;
            }
        }
        Ok(outcome)
    }

    fn serve_from_cache(
        &self,
        ctx: &EngineContext,
        id: &CacheRecordId,
        expected: &[FieldKind],
        outcome: &mut FileOutcome,
    ) {
        let config = ctx.config.as_ref();
        let Some(mut record) = ctx.cache.load_record(id, &config.platform) else {
            outcome.report.warn("Cached record disappeared");
            return;
        };
        record.completeness = record.compute_completeness(expected);

        if config.export_artwork {
            if let Some(compositor) = &ctx.compositor {
                match compositor.compose(&record, outcome.file.base_name()) {
                    Ok(Some(path)) => {
                        outcome.report.line(format!("Artwork: {}", path.display()));
                        outcome.exported = Some(path);
                    }
                    Ok(None) => outcome.report.line("Artwork: nothing to compose"),
                    Err(e) => outcome.report.warn(format!("Artwork: {}", e)),
                }
            }
        }
        outcome.record = record;
    }

    /// Record a failed match: marker in the cache, not-found record.
    fn not_found(ctx: &EngineContext, id: &CacheRecordId, source: &str, outcome: &mut FileOutcome) {
        ctx.cache.mark_unmatched(id, source);
        outcome.record = ResolvedRecord::new(&ctx.config.platform, source);
    }

    async fn scrape(
        &mut self,
        ctx: &EngineContext,
        id: &CacheRecordId,
        action: Action,
        expected: &[FieldKind],
        outcome: &mut FileOutcome,
    ) -> Result<(), EngineError> {
        let config = ctx.config.as_ref();
        let cache = ctx.cache.as_ref();
        let params = &config.match_params;
        let source = self.adapter.name().to_string();
        let file = outcome.file.clone();

        let mut seed = ResolvedRecord::new(&config.platform, &source);
        let mut seeded = action == Action::Update;
        if seeded {
            let filled = cache.fill_blanks(id, &mut seed, Some(&source));
            outcome.report.line(format!("Seeded {} field(s) from cache", filled));
        }

        let mut candidates: Vec<CandidateEntry> = Vec::new();
        outcome.pass = self
            .adapter
            .run_passes(&mut candidates, &file, &file, &mut outcome.report)
            .await?;
        if candidates.is_empty() {
            outcome.report.line("No candidates found");
            Self::not_found(ctx, id, &source, outcome);
            return Ok(());
        }

        let compare = self.adapter.compare_title(&file);
        let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();
        let best = matching::best_match(&compare, &titles, params);
        let mut chosen = best.map(|m| (m.index, m.score));

        if config.interactive && !config.rescan {
            if let Some(chooser) = &ctx.chooser {
                // Accepting the suggestion keeps its score; only a different
                // pick is trusted outright.
                let suggested = best.map(|m| m.index);
                chosen = chooser
                    .choose(&file, &candidates, suggested)
                    .filter(|i| *i < candidates.len())
                    .map(|i| match best {
                        Some(m) if m.index == i => (i, m.score),
                        _ => (i, 100),
                    });
            }
        }

        let Some((index, score)) = chosen else {
            outcome.report.line(format!("No acceptable candidate for '{}'", compare));
            Self::not_found(ctx, id, &source, outcome);
            return Ok(());
        };
        let candidate = &candidates[index];
        outcome.best_candidate = Some(candidate.title.clone());

        if score < params.min_match {
            outcome.report.line(format!(
                "Best match '{}' scored {}%, below {}%",
                candidate.title, score, params.min_match
            ));
            if let Some(log) = &ctx.match_log {
                let path = file.canonical_path();
                let entry = LowMatchEntry {
                    platform: &config.platform,
                    source: &source,
                    candidate: &candidate.title,
                    file_name: file.file_name(),
                    score,
                    path: &path,
                };
                if let Err(e) = log.append(&entry) {
                    outcome.report.warn(format!("Could not write low-match log: {}", e));
                }
            }
            Self::not_found(ctx, id, &source, outcome);
            outcome.record.search_match = score;
            return Ok(());
        }
        outcome.report.line(format!(
            "Match: '{}' ({}%, pass {})",
            candidate.title,
            score,
            outcome.pass.unwrap_or_default()
        ));

        if seeded {
            if let Some(cached_title) = seed.title() {
                let consistent = matching::score_titles(cached_title, &candidate.title, params)
                    .is_some_and(|s| s >= params.min_match);
                if !consistent {
                    outcome.report.warn(format!(
                        "Cached title '{}' does not match '{}', fetching again",
                        cached_title, candidate.title
                    ));
                    let removed = cache.remove_resources(id, &source)?;
                    log::debug!("{}: dropped {} stale resource(s)", file, removed);
                    seed = ResolvedRecord::new(&config.platform, &source);
                    seeded = false;
                }
            }
        }

        let mut hints = HashSet::new();
        for kind in FieldKind::ALL.iter().copied().filter(FieldKind::is_media) {
            if !config.caches(kind) || (!config.refresh && cache.has_entries_of_type(id, kind)) {
                hints.insert(kind);
            }
        }

        let incremental = (seeded && self.adapter.supports_incremental()).then(|| seed.clone());
        let mut record = ResolvedRecord::new(&config.platform, &source);
        let warnings = self
            .adapter
            .get_game_data(candidate, &mut record, &hints, incremental.as_ref())
            .await?;
        for warning in warnings {
            outcome.report.warn(warning);
        }

        if !record.has(FieldKind::Title) {
            record.set_text(FieldKind::Title, candidate.title.clone(), source.clone());
        }
        if seeded {
            let merged = record.merge_missing_from(&seed);
            if merged > 0 {
                outcome.report.line(format!("Kept {} cached field(s)", merged));
            }
        }
        normalize::finalize(&mut record);
        record.found = true;
        record.search_match = score;
        record.completeness = record.compute_completeness(expected);

        cache.add_resources(id, &record, config, &mut outcome.report)?;
        outcome.report.line(format!("Completeness: {}%", record.completeness));
        outcome.record = record;
        Ok(())
    }
}
