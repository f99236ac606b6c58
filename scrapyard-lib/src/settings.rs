//! Engine configuration and the shared settings file.
//!
//! The settings file lives at `~/.config/scrapyard/config.toml`. Values
//! there are defaults; command-line flags override them. The resulting
//! [`EngineConfig`] is immutable and shared by all workers.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use scrapyard_core::FieldKind;

use crate::error::EngineError;
use crate::matching::MatchParams;
use crate::names::{MAX_SEARCH_NAMES, NamingOptions};

/// How a file's cache record id is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
    /// SHA1 of the file contents; survives renames
    #[default]
    Content,
    /// SHA1 of the canonical path; cheap for large disc images
    Path,
}

/// Media kinds stored by default. Video and documents are opt-in.
pub const DEFAULT_MEDIA: &[FieldKind] = &[
    FieldKind::Cover,
    FieldKind::Screenshot,
    FieldKind::Wheel,
    FieldKind::Marquee,
    FieldKind::Texture,
];

/// `[main]` table of the settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MainSettings {
    pub input_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub threads: Option<usize>,
    pub min_match: Option<u8>,
    pub max_search_names: Option<usize>,
    pub drop_subtitles: Option<bool>,
    pub region: Option<String>,
    pub lang: Option<String>,
    /// Media kinds to store (e.g. ["covers", "screenshots", "videos"])
    pub media: Option<Vec<String>>,
    pub id_mode: Option<IdMode>,
    /// CSV file of `base name,alias` rows
    pub aliases: Option<PathBuf>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub extensions: Option<Vec<String>>,
}

/// `[matching]` table: overrides for the scoring constants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub acceptance_score: Option<u8>,
    pub acceptance_floor: Option<u8>,
    pub subtitle_penalty: Option<usize>,
    pub subtitle_length_threshold: Option<usize>,
}

/// `[import]` table: the import-folder source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub dir: Option<PathBuf>,
}

/// The whole settings file. Unknown tables (such as source credentials)
/// are ignored here and read by the crates that own them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    pub main: MainSettings,
    pub matching: MatchingSettings,
    pub import: ImportSettings,
}

/// Immutable configuration of one scrape run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub platform: String,
    /// Source adapter name ("screenscraper", "import", "cache")
    pub source: String,
    pub input_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub log_dir: PathBuf,
    pub export_dir: PathBuf,
    pub import_dir: Option<PathBuf>,
    pub extensions: Vec<String>,
    pub threads: usize,
    pub region: String,
    pub lang: String,
    pub max_search_names: usize,
    pub drop_subtitles: bool,
    pub rescan: bool,
    pub refresh: bool,
    pub only_missing: bool,
    pub get_missing_resources: bool,
    pub interactive: bool,
    pub export_artwork: bool,
    pub id_mode: IdMode,
    /// Media kinds stored in the cache
    pub media: BTreeSet<FieldKind>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub aliases: Arc<HashMap<String, String>>,
    pub match_params: MatchParams,
}

/// Base directory for cache and logs: `<data dir>/scrapyard`.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scrapyard")
}

impl EngineConfig {
    pub fn new(platform: impl Into<String>, source: impl Into<String>) -> Self {
        let platform = platform.into();
        let data = data_dir();
        let input_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            cache_dir: data.join("cache").join(&platform),
            log_dir: data.join("logs"),
            export_dir: input_dir.join("media"),
            input_dir,
            import_dir: None,
            platform,
            source: source.into(),
            extensions: Vec::new(),
            threads: 1,
            region: "us".to_string(),
            lang: "en".to_string(),
            max_search_names: MAX_SEARCH_NAMES,
            drop_subtitles: true,
            rescan: false,
            refresh: false,
            only_missing: false,
            get_missing_resources: false,
            interactive: false,
            export_artwork: false,
            id_mode: IdMode::Content,
            media: DEFAULT_MEDIA.iter().copied().collect(),
            include: None,
            exclude: None,
            aliases: Arc::new(HashMap::new()),
            match_params: MatchParams::default(),
        }
    }

    /// Layer values from the settings file over the defaults.
    pub fn apply_settings(&mut self, settings: &SettingsFile) -> Result<(), EngineError> {
        let main = &settings.main;
        if let Some(dir) = &main.input_dir {
            self.input_dir = dir.clone();
            self.export_dir = dir.join("media");
        }
        if let Some(dir) = &main.cache_dir {
            self.cache_dir = dir.join(&self.platform);
        }
        if let Some(dir) = &main.log_dir {
            self.log_dir = dir.clone();
        }
        if let Some(dir) = &main.export_dir {
            self.export_dir = dir.clone();
        }
        if let Some(n) = main.threads {
            self.threads = n;
        }
        if let Some(n) = main.min_match {
            self.match_params.min_match = n;
        }
        if let Some(n) = main.max_search_names {
            self.max_search_names = n;
        }
        if let Some(b) = main.drop_subtitles {
            self.drop_subtitles = b;
        }
        if let Some(r) = &main.region {
            self.region = r.clone();
        }
        if let Some(l) = &main.lang {
            self.lang = l.clone();
        }
        if let Some(media) = &main.media {
            self.set_media(media)?;
        }
        if let Some(mode) = main.id_mode {
            self.id_mode = mode;
        }
        if let Some(path) = &main.aliases {
            self.aliases = Arc::new(load_aliases(path)?);
        }
        if main.include.is_some() {
            self.include = main.include.clone();
        }
        if main.exclude.is_some() {
            self.exclude = main.exclude.clone();
        }
        if let Some(exts) = &main.extensions {
            self.extensions = exts.clone();
        }

        let m = &settings.matching;
        if let Some(n) = m.acceptance_score {
            self.match_params.acceptance_score = n;
        }
        if let Some(n) = m.acceptance_floor {
            self.match_params.acceptance_floor = n;
        }
        if let Some(n) = m.subtitle_penalty {
            self.match_params.subtitle_penalty = n;
        }
        if let Some(n) = m.subtitle_length_threshold {
            self.match_params.subtitle_length_threshold = n;
        }

        if let Some(dir) = &settings.import.dir {
            self.import_dir = Some(dir.clone());
        }
        Ok(())
    }

    /// Replace the stored media kinds from names like "covers" or "videos".
    /// Non-media names are rejected.
    pub fn set_media(&mut self, names: &[String]) -> Result<(), EngineError> {
        let mut media = BTreeSet::new();
        for name in names {
            let kind: FieldKind = name.parse()?;
            if !kind.is_media() {
                return Err(EngineError::config(format!("'{name}' is not a media type")));
            }
            media.insert(kind);
        }
        self.media = media;
        Ok(())
    }

    /// Whether the cache stores fields of this kind.
    pub fn caches(&self, kind: FieldKind) -> bool {
        !kind.is_media() || self.media.contains(&kind)
    }

    /// Number of workers to start. Interactive runs use one.
    pub fn worker_count(&self) -> usize {
        if self.interactive { 1 } else { self.threads.max(1) }
    }

    /// Fields a complete record has: all text fields plus the stored media.
    pub fn expected_fields(&self) -> Vec<FieldKind> {
        FieldKind::TEXT
            .iter()
            .copied()
            .chain(self.media.iter().copied())
            .collect()
    }

    pub fn naming(&self) -> NamingOptions {
        NamingOptions {
            aliases: self.aliases.clone(),
            drop_subtitles: self.drop_subtitles,
            max_names: self.max_search_names,
        }
    }
}

/// Canonical path to the settings file: `~/.config/scrapyard/config.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("scrapyard").join("config.toml")
}

/// Load the settings file, or defaults when it does not exist.
pub fn load_settings() -> Result<SettingsFile, EngineError> {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Result<SettingsFile, EngineError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SettingsFile::default()),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&contents)
        .map_err(|e| EngineError::config(format!("{}: {}", path.display(), e)))
}

/// Write the settings file atomically.
pub fn save_settings(settings: &SettingsFile, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(settings).map_err(io::Error::other)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Load the full settings file as a pretty-printed TOML string for display.
pub fn load_settings_string() -> Option<String> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    toml::to_string_pretty(&doc).ok()
}

/// Read `base name,alias` rows. Lines starting with `#` are comments.
pub fn load_aliases(path: &Path) -> Result<HashMap<String, String>, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| EngineError::config(format!("{}: {}", path.display(), e)))?;

    let mut aliases = HashMap::new();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping malformed alias row: {e}");
                continue;
            }
        };
        let name = record.get(0).unwrap_or("").trim();
        let alias = record.get(1).unwrap_or("").trim();
        if !name.is_empty() && !alias.is_empty() {
            aliases.insert(name.to_string(), alias.to_string());
        }
    }
    Ok(aliases)
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
