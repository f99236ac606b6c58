//! The scrapyard engine.
//!
//! Files are queued in a [`WorkQueue`], claimed by [`Worker`]s (one per
//! source adapter instance) and resolved into [`ResolvedRecord`]s that are
//! stored in a [`CacheStore`]. Per file, the decision table in [`decision`]
//! chooses whether to skip, refresh, update or serve the stored record.
//!
//! [`ResolvedRecord`]: scrapyard_core::ResolvedRecord

pub mod adapter;
pub mod cache;
pub mod compositor;
pub mod decision;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod match_log;
pub mod matching;
pub mod names;
pub mod normalize;
pub mod pattern;
pub mod pool;
pub mod queue;
pub mod record_id;
pub mod report;
pub mod scanner;
pub mod session_log;
pub mod settings;

pub use adapter::{CacheSource, CandidateChooser, SourceAdapter};
pub use cache::{CacheStats, CacheStore, ResourceCache};
pub use compositor::Compositor;
pub use decision::{ActionFlags, CACHE_SOURCE, CacheState, decide_action};
pub use engine::{EngineContext, FileOutcome, StopReason, Worker, WorkerEvent};
pub use error::{AdapterError, EngineError};
pub use match_log::{LowMatchEntry, LowMatchLog};
pub use matching::{MatchParams, TitleMatch, best_match};
pub use names::NamingOptions;
pub use pool::ScrapePool;
pub use queue::WorkQueue;
pub use report::FileReport;
pub use session_log::{LogEntry, ScrapeLog};
pub use settings::{EngineConfig, IdMode, SettingsFile};
