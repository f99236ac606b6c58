//! Shared data model for scrapyard.
//!
//! Everything the engine, the source adapters and the cache agree on lives
//! here: the file being scraped, the candidates a search returns, the record
//! a scrape produces, the action chosen per file and the per-source quota.

pub mod action;
pub mod error;
pub mod file;
pub mod quota;
pub mod record;

pub use action::{Action, SkipReason};
pub use error::CoreError;
pub use file::{CacheRecordId, FileDescriptor};
pub use quota::{Budget, QuotaState};
pub use record::{CandidateEntry, Field, FieldKind, FieldValue, Media, ResolvedRecord};
