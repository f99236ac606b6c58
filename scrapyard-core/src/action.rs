use serde::{Deserialize, Serialize};

/// What the engine does with one file.
///
/// Exactly one action is chosen per file by the decision table in
/// `scrapyard-lib`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Emit a skipped record without calling the adapter
    Skip(SkipReason),
    /// Full search and fetch, ignoring cached data for this source
    Refresh,
    /// Seed from the cache, re-validate the match, fetch what is missing
    Update,
    /// Load the stored record verbatim
    ServeFromCache,
}

/// Why a file was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// Serving from the cache but nothing is stored for this file
    NotInCache,
    /// Only-missing mode and some source already has data
    OnlyMissing,
    /// This source already has meaningful data; refresh to override
    AlreadyCached,
    /// An earlier run found no acceptable match
    PreviouslyUnmatched,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skip(_) => "skip",
            Self::Refresh => "refresh",
            Self::Update => "update",
            Self::ServeFromCache => "cache",
        }
    }
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotInCache => "no cached data for this file",
            Self::OnlyMissing => "already has cached data (only-missing mode)",
            Self::AlreadyCached => "already cached, use refresh to fetch again",
            Self::PreviouslyUnmatched => "no match found in an earlier run",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip(reason) => write!(f, "skip ({})", reason.message()),
            other => write!(f, "{}", other.label()),
        }
    }
}
