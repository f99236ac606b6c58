//! Per-file action selection.
//!
//! The action is the first rule in [`RULES`] whose predicate holds for the
//! run flags and the file's cache state. Rule order is significant.

use scrapyard_core::{Action, CacheRecordId, FieldKind, SkipReason};

use crate::cache::CacheStore;
use crate::settings::EngineConfig;

/// Name of the pseudo-source that serves stored records.
pub const CACHE_SOURCE: &str = "cache";

/// Run flags relevant to the decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
    /// The worker's source is the cache itself
    pub from_cache: bool,
    pub rescan: bool,
    pub refresh: bool,
    pub only_missing: bool,
    pub get_missing_resources: bool,
}

impl ActionFlags {
    pub fn from_config(config: &EngineConfig, source: &str) -> Self {
        Self {
            from_cache: source == CACHE_SOURCE,
            rescan: config.rescan,
            refresh: config.refresh,
            only_missing: config.only_missing,
            get_missing_resources: config.get_missing_resources,
        }
    }
}

/// What the cache knows about one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheState {
    /// Any source has stored something
    pub has_any_entries: bool,
    /// The current source has stored something
    pub has_own_entries: bool,
    /// The current source has stored more than a title
    pub has_meaningful_entries: bool,
    /// 0-100 share of expected fields stored by the current source
    pub completeness: u8,
    /// An earlier run with this source found no acceptable match
    pub previously_unmatched: bool,
}

impl CacheState {
    pub fn query(
        cache: &dyn CacheStore,
        id: &CacheRecordId,
        source: &str,
        expected: &[FieldKind],
    ) -> Self {
        Self {
            has_any_entries: cache.has_entries(id, None),
            has_own_entries: cache.has_entries(id, Some(source)),
            has_meaningful_entries: cache.has_meaningful_entries(id, Some(source), false),
            completeness: cache.completeness(id, source, expected),
            previously_unmatched: cache.is_unmatched(id, source),
        }
    }
}

/// One row of the decision table.
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&ActionFlags, &CacheState) -> bool,
    pub action: Action,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "serve stored record",
        applies: |f, s| f.from_cache && s.has_any_entries,
        action: Action::ServeFromCache,
    },
    Rule {
        name: "nothing stored to serve",
        applies: |f, s| f.from_cache && !s.has_any_entries,
        action: Action::Skip(SkipReason::NotInCache),
    },
    Rule {
        name: "rescan known file",
        applies: |f, s| f.rescan && s.has_own_entries,
        action: Action::Update,
    },
    Rule {
        name: "forced refresh",
        applies: |f, _| f.refresh,
        action: Action::Refresh,
    },
    Rule {
        name: "only missing",
        applies: |f, s| f.only_missing && s.has_any_entries,
        action: Action::Skip(SkipReason::OnlyMissing),
    },
    Rule {
        name: "fill missing resources",
        applies: |f, s| f.get_missing_resources && s.has_own_entries && s.completeness < 100,
        action: Action::Update,
    },
    Rule {
        name: "already cached",
        applies: |_, s| s.has_meaningful_entries,
        action: Action::Skip(SkipReason::AlreadyCached),
    },
    Rule {
        name: "previously unmatched",
        applies: |f, s| !f.rescan && s.previously_unmatched,
        action: Action::Skip(SkipReason::PreviouslyUnmatched),
    },
    Rule {
        name: "not cached",
        applies: |_, s| !s.has_meaningful_entries,
        action: Action::Refresh,
    },
];

/// First matching rule's action, or `None` if no rule applies.
pub fn decide_action(flags: &ActionFlags, state: &CacheState) -> Option<Action> {
    RULES
        .iter()
        .find(|rule| (rule.applies)(flags, state))
        .map(|rule| {
            log::trace!("Decision rule '{}' -> {}", rule.name, rule.action);
            rule.action
        })
}

#[cfg(test)]
#[path = "tests/decision_tests.rs"]
mod tests;
