//! Shared work queue.
//!
//! All workers pull from one [`WorkQueue`]. Taking an entry is a two-step
//! protocol: [`WorkQueue::has_entry`] locks the queue and, when it is not
//! empty, hands back an [`EntryClaim`] that keeps the lock until
//! [`EntryClaim::take_entry`] consumes it. No two workers can claim the same
//! entry, and nobody observes the queue between the check and the take.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use scrapyard_core::FileDescriptor;

use crate::error::EngineError;
use crate::pattern::FilePatterns;
use crate::scanner;

#[derive(Debug, Default)]
pub struct WorkQueue {
    entries: Mutex<VecDeque<FileDescriptor>>,
}

/// Exclusive hold on a non-empty queue.
///
/// Dropping a claim without taking puts the head entry back.
pub struct EntryClaim<'a> {
    guard: MutexGuard<'a, VecDeque<FileDescriptor>>,
    entry: Option<FileDescriptor>,
}

impl EntryClaim<'_> {
    /// The entry that [`take_entry`](Self::take_entry) will return.
    pub fn peek(&self) -> Option<&FileDescriptor> {
        self.entry.as_ref()
    }

    /// Remove the head entry and release the queue.
    pub fn take_entry(mut self) -> Option<FileDescriptor> {
        self.entry.take()
    }
}

impl Drop for EntryClaim<'_> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.guard.push_front(entry);
        }
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: impl IntoIterator<Item = FileDescriptor>) -> Self {
        Self {
            entries: Mutex::new(files.into_iter().collect()),
        }
    }

    /// Build a queue from a directory scan (sorted, CUE/BIN deduplicated).
    pub fn from_folder(dir: &Path, extensions: &[String]) -> Result<Self, EngineError> {
        let files = scanner::scan_files(dir, &scanner::extension_set(extensions))?;
        Ok(Self::from_files(files))
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<FileDescriptor>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, file: FileDescriptor) {
        self.lock().push_back(file);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Lock the queue and claim its head, or `None` when empty.
    pub fn has_entry(&self) -> Option<EntryClaim<'_>> {
        let mut guard = self.lock();
        let entry = guard.pop_front()?;
        Some(EntryClaim {
            guard,
            entry: Some(entry),
        })
    }

    /// Claim and take the head entry in one step.
    pub fn take_next(&self) -> Option<FileDescriptor> {
        self.has_entry().and_then(EntryClaim::take_entry)
    }

    /// Keep (`include`) or drop (`!include`) entries whose file name matches
    /// any pattern in the comma-separated list. Returns how many entries
    /// were removed. An empty list leaves the queue untouched.
    pub fn filter_files(&self, patterns: &str, include: bool) -> Result<usize, EngineError> {
        let patterns = FilePatterns::parse(patterns)?;
        if patterns.is_empty() {
            return Ok(0);
        }
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|f| patterns.is_match(f.file_name()) == include);
        Ok(before - entries.len())
    }

    /// Remove entries whose path equals one of `paths`. Returns how many
    /// entries were removed.
    pub fn remove_files(&self, paths: &[PathBuf]) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|f| !paths.iter().any(|p| p == f.path()));
        before - entries.len()
    }
}

#[cfg(test)]
#[path = "tests/queue_tests.rs"]
mod tests;
