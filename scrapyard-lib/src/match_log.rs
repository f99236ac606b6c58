//! Audit log of rejected low-confidence matches.
//!
//! One line per rejection, appended as it happens so matches can be
//! reviewed (and aliases added) after a run.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub const LOW_MATCH_LOG_NAME: &str = "low_matches.log";

/// One rejected match.
#[derive(Debug, Clone)]
pub struct LowMatchEntry<'a> {
    pub platform: &'a str,
    pub source: &'a str,
    pub candidate: &'a str,
    pub file_name: &'a str,
    pub score: u8,
    pub path: &'a Path,
}

/// Append-only log file shared by all workers.
#[derive(Debug)]
pub struct LowMatchLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LowMatchLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_dir(log_dir: &Path) -> Self {
        Self::new(log_dir.join(LOW_MATCH_LOG_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LowMatchEntry<'_>) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{} [{}] {}: \"{}\" <- {} ({}%) {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            entry.platform,
            entry.source,
            entry.candidate,
            entry.file_name,
            entry.score,
            entry.path.display(),
        )
    }
}
