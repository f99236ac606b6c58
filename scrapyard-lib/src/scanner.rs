//! Directory scanner for game folders.
//!
//! Collects top-level files with a matching extension, sorted by name.
//! Data tracks (`.bin`/`.img`/`.iso`) that share a stem with a `.cue`
//! sheet are dropped so a disc is scraped once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use scrapyard_core::FileDescriptor;

use crate::error::EngineError;

/// Scan `folder` and return one descriptor per game file.
///
/// An empty extension set accepts every file.
pub fn scan_files(
    folder: &Path,
    extensions: &HashSet<String>,
) -> Result<Vec<FileDescriptor>, EngineError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_matching_extension(p, extensions))
        .collect();
    paths.sort();

    let cue_stems = collect_cue_stems(&paths);
    if !cue_stems.is_empty() {
        paths.retain(|p| !is_data_file_covered_by_cue(p, &cue_stems));
    }

    let files = paths
        .into_iter()
        .map(FileDescriptor::new)
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("Scanned {} files in {}", files.len(), folder.display());
    Ok(files)
}

/// Normalise a list of extensions (with or without a leading dot).
pub fn extension_set(extensions: &[String]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn has_matching_extension(path: &Path, extensions: &HashSet<String>) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_lowercase()))
        .unwrap_or(false)
}

fn collect_cue_stems(files: &[PathBuf]) -> HashSet<String> {
    files
        .iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("cue"))
                .unwrap_or(false)
        })
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(|s| s.to_lowercase()))
        .collect()
}

fn is_data_file_covered_by_cue(path: &Path, cue_stems: &HashSet<String>) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !matches!(ext.as_str(), "bin" | "img" | "iso") {
        return false;
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    cue_stems.contains(&stem)
}
