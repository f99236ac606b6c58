//! End-to-end runs of the worker pool against a scripted source and an
//! on-disk cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use scrapyard_core::{
    Action, Budget, CandidateEntry, FieldKind, FileDescriptor, Media, QuotaState, ResolvedRecord,
    SkipReason,
};
use scrapyard_lib::adapter::{CacheSource, CandidateChooser, SourceAdapter};
use scrapyard_lib::cache::{CacheStore, ResourceCache};
use scrapyard_lib::compositor::Compositor;
use scrapyard_lib::engine::{EngineContext, FileOutcome, StopReason, WorkerEvent};
use scrapyard_lib::error::{AdapterError, EngineError};
use scrapyard_lib::match_log::LowMatchLog;
use scrapyard_lib::names::NamingOptions;
use scrapyard_lib::pool::ScrapePool;
use scrapyard_lib::queue::WorkQueue;
use scrapyard_lib::record_id;
use scrapyard_lib::report::FileReport;
use scrapyard_lib::settings::{EngineConfig, IdMode};

const SOURCE: &str = "mock";

/// Answers searches from a fixed table and counts every remote call.
struct MockAdapter {
    naming: NamingOptions,
    results: HashMap<String, Vec<String>>,
    budget: Budget,
    incremental: bool,
    calls: Arc<AtomicUsize>,
}

impl MockAdapter {
    fn new(calls: &Arc<AtomicUsize>) -> Self {
        Self {
            naming: NamingOptions::default(),
            results: HashMap::new(),
            budget: Budget::Unlimited,
            incremental: false,
            calls: calls.clone(),
        }
    }

    fn answer(mut self, query: &str, titles: &[&str]) -> Self {
        self.results
            .insert(query.to_string(), titles.iter().map(|t| t.to_string()).collect());
        self
    }

    fn budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    fn incremental(mut self) -> Self {
        self.incremental = true;
        self
    }

    fn remote_call(&mut self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.budget.consume(1);
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn name(&self) -> &str {
        SOURCE
    }

    fn naming(&self) -> &NamingOptions {
        &self.naming
    }

    fn fetch_order(&self) -> &[FieldKind] {
        &[FieldKind::Title, FieldKind::Developer, FieldKind::Cover]
    }

    fn quota(&self) -> QuotaState {
        QuotaState {
            requests: self.budget,
            errors: Budget::Unlimited,
        }
    }

    fn supports_incremental(&self) -> bool {
        self.incremental
    }

    async fn search(
        &mut self,
        query: &str,
        _file: &FileDescriptor,
    ) -> Result<Vec<CandidateEntry>, AdapterError> {
        if self.budget.is_exhausted() {
            return Err(AdapterError::QuotaExhausted);
        }
        self.remote_call();
        Ok(self
            .results
            .get(query)
            .map(|titles| {
                titles
                    .iter()
                    .enumerate()
                    .map(|(i, t)| CandidateEntry::new(t.clone(), format!("id-{i}"), "snes"))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_field(
        &mut self,
        kind: FieldKind,
        candidate: &CandidateEntry,
        record: &mut ResolvedRecord,
    ) -> Result<bool, AdapterError> {
        if self.budget.is_exhausted() {
            return Err(AdapterError::QuotaExhausted);
        }
        self.remote_call();
        match kind {
            FieldKind::Title => Ok(record.set_text(kind, candidate.title.clone(), SOURCE)),
            FieldKind::Developer => Ok(record.set_text(kind, "Mock Studio", SOURCE)),
            FieldKind::Cover => Ok(record.set_media(
                kind,
                Media::Data {
                    bytes: vec![0x89, 0x50, 0x4e, 0x47],
                    extension: "png".to_string(),
                },
                SOURCE,
            )),
            _ => Err(AdapterError::Unavailable(kind)),
        }
    }
}

struct FixedChooser(usize);

impl CandidateChooser for FixedChooser {
    fn choose(
        &self,
        _file: &FileDescriptor,
        _candidates: &[CandidateEntry],
        _suggested: Option<usize>,
    ) -> Option<usize> {
        Some(self.0)
    }
}

/// Presses Enter: always takes the automatic suggestion.
struct AcceptSuggestion;

impl CandidateChooser for AcceptSuggestion {
    fn choose(
        &self,
        _file: &FileDescriptor,
        _candidates: &[CandidateEntry],
        suggested: Option<usize>,
    ) -> Option<usize> {
        suggested
    }
}

#[derive(Default)]
struct RecordingCompositor {
    calls: AtomicUsize,
}

impl Compositor for RecordingCompositor {
    fn compose(
        &self,
        record: &ResolvedRecord,
        base_name: &str,
    ) -> Result<Option<PathBuf>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(record.has(FieldKind::Cover));
        Ok(Some(PathBuf::from(format!("/export/{base_name}.png"))))
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    cache: Arc<ResourceCache>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(ResourceCache::open(dir.path().join("cache")).unwrap());
        Self { dir, cache }
    }

    fn rom(&self, name: &str) -> FileDescriptor {
        let path = self.dir.path().join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        FileDescriptor::new(path).unwrap()
    }

    fn log_dir(&self) -> PathBuf {
        self.dir.path().join("logs")
    }

    fn context(&self, files: Vec<FileDescriptor>, config: EngineConfig) -> EngineContext {
        EngineContext::new(
            Arc::new(WorkQueue::from_files(files)),
            self.cache.clone(),
            Arc::new(config),
        )
        .with_match_log(Arc::new(LowMatchLog::in_dir(&self.log_dir())))
    }

    /// Store a record as if an earlier run had produced it.
    fn seed(&self, file: &FileDescriptor, record: &ResolvedRecord) {
        let id = record_id::compute(file, IdMode::Content).unwrap();
        self.cache
            .add_resources(&id, record, &config(), &mut FileReport::new(file.file_name()))
            .unwrap();
    }

    fn id(&self, file: &FileDescriptor) -> scrapyard_core::CacheRecordId {
        record_id::compute(file, IdMode::Content).unwrap()
    }
}

fn config() -> EngineConfig {
    EngineConfig::new("snes", SOURCE)
}

async fn run(
    adapters: Vec<Box<dyn SourceAdapter>>,
    ctx: EngineContext,
) -> (Vec<FileOutcome>, Vec<StopReason>) {
    let mut pool = ScrapePool::start(adapters, ctx);
    let mut outcomes = Vec::new();
    let mut reasons = Vec::new();
    while let Some(event) = pool.recv().await {
        match event {
            WorkerEvent::FileFinished(outcome) => outcomes.push(*outcome),
            WorkerEvent::Finished { reason, .. } => reasons.push(reason),
            WorkerEvent::FileStarted { .. } => {}
        }
    }
    (outcomes, reasons)
}

fn cached_title(cache: &dyn CacheStore, id: &scrapyard_core::CacheRecordId) -> Option<String> {
    cache
        .load_record(id, "snes")
        .and_then(|r| r.title().map(str::to_string))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_picks_numbered_sequel_and_caches_it() {
    let fx = Fixture::new();
    let file = fx.rom("Super Game 2 (USA).sfc");
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls).answer(
        "Super Game 2",
        &["Super Game", "Super Game 2", "Super Game 3"],
    );

    let (outcomes, reasons) = run(vec![Box::new(adapter)], fx.context(vec![file.clone()], config())).await;

    assert_eq!(reasons, vec![StopReason::QueueDrained]);
    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.action, Some(Action::Refresh));
    assert!(outcome.is_found());
    assert_eq!(outcome.record.title(), Some("Super Game 2"));
    assert_eq!(outcome.record.search_match, 100);
    assert_eq!(outcome.record.text(FieldKind::Developer), Some("Mock Studio"));
    assert_eq!(outcome.pass, Some(1));

    let id = fx.id(&file);
    assert!(fx.cache.has_meaningful_entries(&id, Some(SOURCE), true));
    assert_eq!(cached_title(fx.cache.as_ref(), &id).as_deref(), Some("Super Game 2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_run_skips_cached_file_without_remote_calls() {
    let fx = Fixture::new();
    let file = fx.rom("Super Game.sfc");
    let calls = Arc::new(AtomicUsize::new(0));

    let first = MockAdapter::new(&calls).answer("Super Game", &["Super Game"]);
    run(vec![Box::new(first)], fx.context(vec![file.clone()], config())).await;
    let after_first = calls.load(Ordering::SeqCst);
    assert!(after_first > 0);

    let second = MockAdapter::new(&calls).answer("Super Game", &["Super Game"]);
    let (outcomes, _) = run(vec![Box::new(second)], fx.context(vec![file], config())).await;

    assert_eq!(outcomes[0].action, Some(Action::Skip(SkipReason::AlreadyCached)));
    assert!(outcomes[0].is_skipped());
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_low_match_is_logged_and_remembered() {
    let fx = Fixture::new();
    let file = fx.rom("Super Game.sfc");
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls).answer("Super Game", &["Totally Different Thing"]);

    let (outcomes, _) = run(vec![Box::new(adapter)], fx.context(vec![file.clone()], config())).await;

    let outcome = &outcomes[0];
    assert!(!outcome.is_found());
    assert_eq!(outcome.best_candidate.as_deref(), Some("Totally Different Thing"));
    assert!(outcome.record.search_match < 40);
    assert!(fx.cache.is_unmatched(&fx.id(&file), SOURCE));

    let log = std::fs::read_to_string(fx.log_dir().join("low_matches.log")).unwrap();
    assert!(log.contains("[snes] mock: \"Totally Different Thing\" <- Super Game.sfc"));

    // The next run does not ask again
    let again = MockAdapter::new(&calls).answer("Super Game", &["Totally Different Thing"]);
    let before = calls.load(Ordering::SeqCst);
    let (outcomes, _) = run(vec![Box::new(again)], fx.context(vec![file], config())).await;
    assert_eq!(
        outcomes[0].action,
        Some(Action::Skip(SkipReason::PreviouslyUnmatched))
    );
    assert_eq!(calls.load(Ordering::SeqCst), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_candidates_marks_unmatched() {
    let fx = Fixture::new();
    let file = fx.rom("Unknown Title.sfc");
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls);

    let (outcomes, _) = run(vec![Box::new(adapter)], fx.context(vec![file.clone()], config())).await;

    assert!(!outcomes[0].is_found());
    assert_eq!(outcomes[0].pass, None);
    assert_eq!(outcomes[0].best_candidate, None);
    assert!(fx.cache.is_unmatched(&fx.id(&file), SOURCE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_quota_guard_stops_remote_calls() {
    let fx = Fixture::new();
    let files = vec![fx.rom("Super Game.sfc"), fx.rom("Other Game.sfc"), fx.rom("Third Game.sfc")];
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls)
        .answer("Super Game", &["Super Game"])
        .budget(Budget::Remaining(1));
    let ctx = fx.context(files, config());
    let queue = ctx.queue.clone();

    let (outcomes, reasons) = run(vec![Box::new(adapter)], ctx).await;

    assert_eq!(reasons, vec![StopReason::QuotaExhausted]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].file.file_name(), "Super Game.sfc");
    assert!(outcomes[0].report.has_warnings());
    assert_eq!(queue.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_setup_failure_leaves_queue_untouched() {
    let fx = Fixture::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls).budget(Budget::Remaining(0));
    let ctx = fx.context(vec![fx.rom("Super Game.sfc")], config());
    let queue = ctx.queue.clone();

    let (outcomes, reasons) = run(vec![Box::new(adapter)], ctx).await;

    assert_eq!(reasons, vec![StopReason::SetupFailed]);
    assert!(outcomes.is_empty());
    assert_eq!(queue.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_workers_one_entry() {
    let fx = Fixture::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let adapters: Vec<Box<dyn SourceAdapter>> = (0..2)
        .map(|_| {
            Box::new(MockAdapter::new(&calls).answer("Super Game", &["Super Game"]))
                as Box<dyn SourceAdapter>
        })
        .collect();

    let (outcomes, reasons) = run(adapters, fx.context(vec![fx.rom("Super Game.sfc")], config())).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(reasons.len(), 2);
    assert!(reasons.iter().all(|r| *r == StopReason::QueueDrained));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_file_processed_once_by_many_workers() {
    let fx = Fixture::new();
    let files: Vec<FileDescriptor> = (0..40).map(|i| fx.rom(&format!("Game {i:02}.sfc"))).collect();
    let calls = Arc::new(AtomicUsize::new(0));
    let adapters: Vec<Box<dyn SourceAdapter>> = (0..4)
        .map(|_| Box::new(MockAdapter::new(&calls)) as Box<dyn SourceAdapter>)
        .collect();

    let (outcomes, reasons) = run(adapters, fx.context(files, config())).await;

    assert_eq!(reasons.len(), 4);
    let mut names: Vec<&str> = outcomes.iter().map(|o| o.file.file_name()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update_with_mismatched_cache_refetches() {
    let fx = Fixture::new();
    let file = fx.rom("Super Game.sfc");
    let mut stale = ResolvedRecord::new("snes", SOURCE);
    stale.set_text(FieldKind::Title, "Completely Unrelated", SOURCE);
    stale.set_text(FieldKind::Developer, "Old Studio", SOURCE);
    fx.seed(&file, &stale);

    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls).answer("Super Game", &["Super Game"]);
    let mut cfg = config();
    cfg.rescan = true;

    let (outcomes, _) = run(vec![Box::new(adapter)], fx.context(vec![file.clone()], cfg)).await;

    let outcome = &outcomes[0];
    assert_eq!(outcome.action, Some(Action::Update));
    assert!(outcome.is_found());
    assert!(outcome
        .report
        .warnings()
        .iter()
        .any(|w| w.contains("does not match")));
    assert_eq!(outcome.record.text(FieldKind::Developer), Some("Mock Studio"));

    let stored = fx.cache.load_record(&fx.id(&file), "snes").unwrap();
    assert_eq!(stored.title(), Some("Super Game"));
    assert_eq!(stored.text(FieldKind::Developer), Some("Mock Studio"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_incremental_update_fetches_only_missing_fields() {
    let fx = Fixture::new();
    let file = fx.rom("Super Game.sfc");
    let mut cached = ResolvedRecord::new("snes", SOURCE);
    cached.set_text(FieldKind::Title, "Super Game", SOURCE);
    cached.set_text(FieldKind::Developer, "Old Studio", SOURCE);
    fx.seed(&file, &cached);

    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls)
        .answer("Super Game", &["Super Game"])
        .incremental();
    let mut cfg = config();
    cfg.rescan = true;

    let (outcomes, _) = run(vec![Box::new(adapter)], fx.context(vec![file], cfg)).await;

    let outcome = &outcomes[0];
    assert_eq!(outcome.action, Some(Action::Update));
    // One search plus the cover
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(outcome.record.text(FieldKind::Developer), Some("Old Studio"));
    assert!(outcome.record.has(FieldKind::Cover));
    assert!(!outcome.report.has_warnings());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interactive_choice_overrides_scoring() {
    let fx = Fixture::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls).answer("Super Game", &["Super Game", "Something Else"]);
    let mut cfg = config();
    cfg.interactive = true;
    let ctx = fx
        .context(vec![fx.rom("Super Game.sfc")], cfg)
        .with_chooser(Arc::new(FixedChooser(1)));

    let (outcomes, _) = run(vec![Box::new(adapter)], ctx).await;

    assert!(outcomes[0].is_found());
    assert_eq!(outcomes[0].record.title(), Some("Something Else"));
    assert_eq!(outcomes[0].record.search_match, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_accepted_suggestion_still_needs_min_match() {
    let fx = Fixture::new();
    let file = fx.rom("Super Game.sfc");
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls).answer("Super Game", &["Totally Different Thing"]);
    let mut cfg = config();
    cfg.interactive = true;
    let ctx = fx
        .context(vec![file.clone()], cfg)
        .with_chooser(Arc::new(AcceptSuggestion));

    let (outcomes, _) = run(vec![Box::new(adapter)], ctx).await;

    let outcome = &outcomes[0];
    assert!(!outcome.is_found());
    assert!(outcome.record.search_match < 40);
    assert!(fx.cache.is_unmatched(&fx.id(&file), SOURCE));
    assert_eq!(cached_title(fx.cache.as_ref(), &fx.id(&file)), None);
    let log = std::fs::read_to_string(fx.log_dir().join("low_matches.log")).unwrap();
    assert!(log.contains("Super Game.sfc"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_accepted_suggestion_keeps_its_score() {
    let fx = Fixture::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = MockAdapter::new(&calls).answer("Super Game", &["Super Games"]);
    let mut cfg = config();
    cfg.interactive = true;
    let ctx = fx
        .context(vec![fx.rom("Super Game.sfc")], cfg)
        .with_chooser(Arc::new(AcceptSuggestion));

    let (outcomes, _) = run(vec![Box::new(adapter)], ctx).await;

    assert!(outcomes[0].is_found());
    assert_eq!(outcomes[0].record.search_match, 90);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_serve_from_cache_exports_artwork() {
    let fx = Fixture::new();
    let file = fx.rom("Super Game.sfc");
    let mut stored = ResolvedRecord::new("snes", SOURCE);
    stored.set_text(FieldKind::Title, "Super Game", SOURCE);
    stored.set_media(
        FieldKind::Cover,
        Media::Data {
            bytes: vec![1, 2, 3],
            extension: "png".to_string(),
        },
        SOURCE,
    );
    fx.seed(&file, &stored);

    let mut cfg = EngineConfig::new("snes", "cache");
    cfg.export_artwork = true;
    let compositor = Arc::new(RecordingCompositor::default());
    let ctx = fx
        .context(vec![file, fx.rom("Never Scraped.sfc")], cfg)
        .with_compositor(compositor.clone());

    let (outcomes, _) = run(vec![Box::new(CacheSource::default())], ctx).await;

    assert_eq!(outcomes.len(), 2);
    let served = &outcomes[0];
    assert_eq!(served.action, Some(Action::ServeFromCache));
    assert_eq!(served.record.title(), Some("Super Game"));
    assert_eq!(served.exported.as_deref(), Some(Path::new("/export/Super Game.png")));
    assert_eq!(compositor.calls.load(Ordering::SeqCst), 1);

    assert_eq!(outcomes[1].action, Some(Action::Skip(SkipReason::NotInCache)));
}
