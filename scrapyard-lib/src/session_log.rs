use std::path::{Path, PathBuf};

use crate::engine::{FileOutcome, StopReason};

/// A single entry in the run log.
#[derive(Debug, Clone)]
pub enum LogEntry {
    Matched {
        file: String,
        title: String,
        score: u8,
        completeness: u8,
        warnings: Vec<String>,
    },
    LowMatch {
        file: String,
        candidate: String,
        score: u8,
    },
    NotFound {
        file: String,
    },
    Skipped {
        file: String,
        reason: String,
    },
    Cached {
        file: String,
        title: String,
        exported: Option<PathBuf>,
    },
    Failed {
        file: String,
        message: String,
    },
}

impl LogEntry {
    pub fn from_outcome(outcome: &FileOutcome) -> Self {
        let file = outcome.file.file_name().to_string();
        let record = &outcome.record;
        let title = || record.title().unwrap_or_default().to_string();

        if let Some(message) = &outcome.error {
            return Self::Failed {
                file,
                message: message.clone(),
            };
        }
        match outcome.action {
            Some(scrapyard_core::Action::Skip(reason)) => Self::Skipped {
                file,
                reason: reason.message().to_string(),
            },
            Some(scrapyard_core::Action::ServeFromCache) if record.found => Self::Cached {
                file,
                title: title(),
                exported: outcome.exported.clone(),
            },
            _ if record.found => Self::Matched {
                file,
                title: title(),
                score: record.search_match,
                completeness: record.completeness,
                warnings: outcome.report.warnings().to_vec(),
            },
            _ => match &outcome.best_candidate {
                Some(candidate) => Self::LowMatch {
                    file,
                    candidate: candidate.clone(),
                    score: record.search_match,
                },
                None => Self::NotFound { file },
            },
        }
    }
}

/// Collects per-file results of a run and writes a log file.
#[derive(Debug, Default)]
pub struct ScrapeLog {
    entries: Vec<LogEntry>,
    stops: Vec<StopReason>,
}

impl ScrapeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn add_outcome(&mut self, outcome: &FileOutcome) {
        self.add(LogEntry::from_outcome(outcome));
    }

    pub fn add_stop(&mut self, reason: StopReason) {
        self.stops.push(reason);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn summary(&self) -> LogSummary {
        let mut summary = LogSummary::default();
        for entry in &self.entries {
            match entry {
                LogEntry::Matched { warnings, .. } => {
                    summary.matched += 1;
                    if !warnings.is_empty() {
                        summary.with_warnings += 1;
                    }
                }
                LogEntry::LowMatch { .. } => summary.low_match += 1,
                LogEntry::NotFound { .. } => summary.not_found += 1,
                LogEntry::Skipped { .. } => summary.skipped += 1,
                LogEntry::Cached { exported, .. } => {
                    summary.cached += 1;
                    if exported.is_some() {
                        summary.exported += 1;
                    }
                }
                LogEntry::Failed { .. } => summary.failed += 1,
            }
        }
        summary.quota_stops = self
            .stops
            .iter()
            .filter(|r| **r == StopReason::QuotaExhausted)
            .count();
        summary
    }

    /// Write the log to a file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        use std::io::Write;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        let summary = self.summary();

        writeln!(file, "=== Scrape Log ===")?;
        writeln!(
            file,
            "Date: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(file)?;
        writeln!(file, "--- Summary ---")?;
        writeln!(
            file,
            "Matched: {} ({} with warnings)",
            summary.matched, summary.with_warnings
        )?;
        writeln!(file, "Low matches: {}", summary.low_match)?;
        writeln!(file, "Not found: {}", summary.not_found)?;
        writeln!(file, "Skipped: {}", summary.skipped)?;
        writeln!(file, "From cache: {} ({} exported)", summary.cached, summary.exported)?;
        writeln!(file, "Errors: {}", summary.failed)?;
        for stop in &self.stops {
            if *stop != StopReason::QueueDrained {
                writeln!(file, "Worker stopped: {}", stop)?;
            }
        }
        writeln!(file)?;
        writeln!(file, "--- Details ---")?;
        writeln!(file)?;

        for entry in &self.entries {
            match entry {
                LogEntry::Matched {
                    file: f,
                    title,
                    score,
                    completeness,
                    warnings,
                } => {
                    writeln!(
                        file,
                        "[OK] {} -> \"{}\" ({}% match, {}% complete)",
                        f, title, score, completeness
                    )?;
                    for w in warnings {
                        writeln!(file, "     Warning: {}", w)?;
                    }
                }
                LogEntry::LowMatch {
                    file: f,
                    candidate,
                    score,
                } => {
                    writeln!(file, "[LOW] {} -> \"{}\" ({}%)", f, candidate, score)?;
                }
                LogEntry::NotFound { file: f } => {
                    writeln!(file, "[NOT FOUND] {}", f)?;
                }
                LogEntry::Skipped { file: f, reason } => {
                    writeln!(file, "[SKIPPED] {}: {}", f, reason)?;
                }
                LogEntry::Cached {
                    file: f,
                    title,
                    exported,
                } => {
                    writeln!(file, "[CACHE] {} -> \"{}\"", f, title)?;
                    if let Some(path) = exported {
                        writeln!(file, "     Artwork: {}", path.display())?;
                    }
                }
                LogEntry::Failed { file: f, message } => {
                    writeln!(file, "[ERROR] {}: {}", f, message)?;
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogSummary {
    pub matched: usize,
    pub with_warnings: usize,
    pub low_match: usize,
    pub not_found: usize,
    pub skipped: usize,
    pub cached: usize,
    pub exported: usize,
    pub failed: usize,
    pub quota_stops: usize,
}
