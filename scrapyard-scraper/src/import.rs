//! Import folder as a [`SourceAdapter`].
//!
//! Hand-curated data sits next to the roms' base names:
//!
//! ```text
//! <dir>/textual/<base name>.toml      title, description, developer, ...
//! <dir>/<kind>/<base name>.<ext>      cover, screenshot, wheel, ...
//! ```
//!
//! Matching is by exact base name, so the single candidate always carries
//! the file's own compare title. The folder has no request limit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scrapyard_core::{CandidateEntry, FieldKind, FileDescriptor, Media, QuotaState, ResolvedRecord};
use scrapyard_lib::{AdapterError, FileReport, NamingOptions, SourceAdapter};
use serde::Deserialize;

pub const IMPORT_SOURCE: &str = "import";

const TEXTUAL_DIR: &str = "textual";

const FETCH_ORDER: &[FieldKind] = FieldKind::ALL;

/// Contents of `textual/<base name>.toml`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ImportedText {
    pub title: Option<String>,
    pub description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub release_date: Option<String>,
    pub players: Option<String>,
    pub age_rating: Option<String>,
    pub tags: Vec<String>,
    pub franchises: Vec<String>,
    pub rating: Option<String>,
}

impl ImportedText {
    fn text(&self, kind: FieldKind) -> Option<&str> {
        let value = match kind {
            FieldKind::Title => &self.title,
            FieldKind::Description => &self.description,
            FieldKind::Developer => &self.developer,
            FieldKind::Publisher => &self.publisher,
            FieldKind::ReleaseDate => &self.release_date,
            FieldKind::Players => &self.players,
            FieldKind::AgeRating => &self.age_rating,
            FieldKind::Rating => &self.rating,
            _ => return None,
        };
        value.as_deref()
    }

    fn list(&self, kind: FieldKind) -> Option<&[String]> {
        match kind {
            FieldKind::Tags => Some(&self.tags),
            FieldKind::Franchises => Some(&self.franchises),
            _ => None,
        }
    }
}

pub struct ImportSource {
    dir: PathBuf,
    available: bool,
    naming: NamingOptions,
    /// Parsed textual file per base name
    texts: HashMap<String, ImportedText>,
}

impl ImportSource {
    /// A missing folder leaves the source without budget, so its worker
    /// reports a setup failure instead of processing files.
    pub fn new(dir: impl Into<PathBuf>, naming: NamingOptions) -> Self {
        let dir = dir.into();
        let available = dir.is_dir();
        if !available {
            log::error!("Import folder {} does not exist", dir.display());
        }
        Self {
            dir,
            available,
            naming,
            texts: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn textual_path(&self, base_name: &str) -> PathBuf {
        self.dir
            .join(TEXTUAL_DIR)
            .join(format!("{}.toml", base_name))
    }

    /// First file in `<dir>/<kind>/` whose stem is `base_name`.
    fn media_path(&self, kind: FieldKind, base_name: &str) -> Option<PathBuf> {
        let folder = self.dir.join(kind.name());
        let entries = std::fs::read_dir(&folder).ok()?;
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| p.file_stem().and_then(|s| s.to_str()) == Some(base_name))
            .collect();
        matches.sort();
        matches.into_iter().next()
    }

    fn has_any_data(&self, base_name: &str) -> bool {
        self.textual_path(base_name).is_file()
            || FieldKind::ALL
                .iter()
                .filter(|k| k.is_media())
                .any(|k| self.media_path(*k, base_name).is_some())
    }

    fn load_text(&mut self, base_name: &str) -> Result<&ImportedText, AdapterError> {
        if !self.texts.contains_key(base_name) {
            let path = self.textual_path(base_name);
            let text = match std::fs::read_to_string(&path) {
                Ok(contents) => toml::from_str(&contents).map_err(|e| {
                    AdapterError::response(format!("{}: {}", path.display(), e))
                })?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => ImportedText::default(),
                Err(e) => return Err(e.into()),
            };
            self.texts.insert(base_name.to_string(), text);
        }
        self.texts
            .get(base_name)
            .ok_or_else(|| AdapterError::response("textual data not loaded"))
    }
}

#[async_trait]
impl SourceAdapter for ImportSource {
    fn name(&self) -> &str {
        IMPORT_SOURCE
    }

    fn naming(&self) -> &NamingOptions {
        &self.naming
    }

    fn fetch_order(&self) -> &[FieldKind] {
        FETCH_ORDER
    }

    fn quota(&self) -> QuotaState {
        if self.available {
            QuotaState::unlimited()
        } else {
            QuotaState::exhausted()
        }
    }

    fn supports_incremental(&self) -> bool {
        true
    }

    /// Looks up `query` as a base name.
    async fn search(
        &mut self,
        query: &str,
        file: &FileDescriptor,
    ) -> Result<Vec<CandidateEntry>, AdapterError> {
        if !self.has_any_data(query) {
            return Ok(Vec::new());
        }
        Ok(vec![CandidateEntry::new(
            self.compare_title(file),
            query,
            "",
        )])
    }

    /// A single pass on the file's own base name.
    async fn run_passes(
        &mut self,
        candidates: &mut Vec<CandidateEntry>,
        _search_file: &FileDescriptor,
        original_file: &FileDescriptor,
        report: &mut FileReport,
    ) -> Result<Option<usize>, AdapterError> {
        if !self.available {
            return Err(AdapterError::setup(format!(
                "import folder {} does not exist",
                self.dir.display()
            )));
        }
        let found = self
            .search(original_file.base_name(), original_file)
            .await?;
        if found.is_empty() {
            return Ok(None);
        }
        report.line(format!("Import data for '{}'", original_file.base_name()));
        candidates.extend(found);
        Ok(Some(1))
    }

    async fn fetch_field(
        &mut self,
        kind: FieldKind,
        candidate: &CandidateEntry,
        record: &mut ResolvedRecord,
    ) -> Result<bool, AdapterError> {
        let base_name = candidate.id.as_str();
        if kind.is_media() {
            return Ok(match self.media_path(kind, base_name) {
                Some(path) => record.set_media(kind, Media::File(path), IMPORT_SOURCE),
                None => false,
            });
        }

        let text = self.load_text(base_name)?;
        if let Some(value) = text.text(kind) {
            return Ok(record.set_text(kind, value, IMPORT_SOURCE));
        }
        if let Some(items) = text.list(kind) {
            return Ok(record.set_list(kind, items.to_vec(), IMPORT_SOURCE));
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "tests/import_tests.rs"]
mod tests;
