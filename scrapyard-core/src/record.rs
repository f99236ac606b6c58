//! Search candidates and resolved records.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Every field a record can carry, textual and binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Title,
    Description,
    Developer,
    Publisher,
    ReleaseDate,
    Players,
    AgeRating,
    Tags,
    Franchises,
    Rating,
    /// Front box art
    Cover,
    /// In-game screenshot
    Screenshot,
    /// Transparent logo
    Wheel,
    /// Arcade-style marquee banner
    Marquee,
    /// Physical media texture (cartridge label, disc face)
    Texture,
    Video,
    Manual,
    /// Soundtrack sample
    Chiptune,
    /// Walkthrough or strategy guide
    Guides,
}

impl FieldKind {
    pub const ALL: &'static [FieldKind] = &[
        FieldKind::Title,
        FieldKind::Description,
        FieldKind::Developer,
        FieldKind::Publisher,
        FieldKind::ReleaseDate,
        FieldKind::Players,
        FieldKind::AgeRating,
        FieldKind::Tags,
        FieldKind::Franchises,
        FieldKind::Rating,
        FieldKind::Cover,
        FieldKind::Screenshot,
        FieldKind::Wheel,
        FieldKind::Marquee,
        FieldKind::Texture,
        FieldKind::Video,
        FieldKind::Manual,
        FieldKind::Chiptune,
        FieldKind::Guides,
    ];

    /// Textual fields, in display order.
    pub const TEXT: &'static [FieldKind] = &[
        FieldKind::Title,
        FieldKind::Description,
        FieldKind::Developer,
        FieldKind::Publisher,
        FieldKind::ReleaseDate,
        FieldKind::Players,
        FieldKind::AgeRating,
        FieldKind::Tags,
        FieldKind::Franchises,
        FieldKind::Rating,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Developer => "developer",
            Self::Publisher => "publisher",
            Self::ReleaseDate => "release_date",
            Self::Players => "players",
            Self::AgeRating => "age_rating",
            Self::Tags => "tags",
            Self::Franchises => "franchises",
            Self::Rating => "rating",
            Self::Cover => "cover",
            Self::Screenshot => "screenshot",
            Self::Wheel => "wheel",
            Self::Marquee => "marquee",
            Self::Texture => "texture",
            Self::Video => "video",
            Self::Manual => "manual",
            Self::Chiptune => "chiptune",
            Self::Guides => "guides",
        }
    }

    /// True for binary resources (artwork, video, documents, audio).
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::Cover
                | Self::Screenshot
                | Self::Wheel
                | Self::Marquee
                | Self::Texture
                | Self::Video
                | Self::Manual
                | Self::Chiptune
                | Self::Guides
        )
    }

    /// File extension used when a source does not report one.
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::Manual => "pdf",
            Self::Chiptune => "vgm",
            Self::Guides => "txt",
            _ => "png",
        }
    }
}

impl FromStr for FieldKind {
    type Err = CoreError;

    /// Accepts singular and plural names ("cover", "covers").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "title" => Self::Title,
            "description" => Self::Description,
            "developer" => Self::Developer,
            "publisher" => Self::Publisher,
            "release_date" | "releasedate" | "date" => Self::ReleaseDate,
            "players" => Self::Players,
            "age_rating" | "ages" | "age" => Self::AgeRating,
            "tags" | "genres" => Self::Tags,
            "franchises" => Self::Franchises,
            "rating" => Self::Rating,
            "cover" | "covers" => Self::Cover,
            "screenshot" | "screenshots" => Self::Screenshot,
            "wheel" | "wheels" => Self::Wheel,
            "marquee" | "marquees" => Self::Marquee,
            "texture" | "textures" => Self::Texture,
            "video" | "videos" => Self::Video,
            "manual" | "manuals" => Self::Manual,
            "chiptune" | "chiptunes" => Self::Chiptune,
            "guide" | "guides" => Self::Guides,
            _ => return Err(CoreError::unknown_field_kind(s)),
        };
        Ok(kind)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle to a binary resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Media {
    /// Downloaded bytes not yet written anywhere
    Data { bytes: Vec<u8>, extension: String },
    /// A file on disk (cache entry or import folder)
    File(PathBuf),
    /// A remote location that was not downloaded
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Media(Media),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_media(&self) -> Option<&Media> {
        match self {
            Self::Media(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|i| i.trim().is_empty()),
            Self::Media(Media::Data { bytes, .. }) => bytes.is_empty(),
            Self::Media(Media::File(_)) => false,
            Self::Media(Media::Url(url)) => url.is_empty(),
        }
    }
}

/// A field value tagged with the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub value: FieldValue,
    pub source: String,
}

/// One possible match returned by an adapter's search step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub title: String,
    /// Source-specific identifier
    pub id: String,
    /// Platform label as reported by the source
    pub platform: String,
    /// Raw source data kept for field extraction after selection
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl CandidateEntry {
    pub fn new(title: impl Into<String>, id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            platform: platform.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Per-file scrape result.
///
/// Fields are keyed by [`FieldKind`]; each carries its provenance. Empty
/// values are never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub platform: String,
    /// Source that resolved the record ("skipped" for skipped files)
    pub source: String,
    pub found: bool,
    /// 0-100 confidence of the title match
    pub search_match: u8,
    /// 0-100 share of expected fields present
    pub completeness: u8,
    fields: BTreeMap<FieldKind, Field>,
}

pub const SKIPPED_SOURCE: &str = "skipped";

impl ResolvedRecord {
    pub fn new(platform: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// A not-found record tagged as skipped.
    pub fn skipped(platform: impl Into<String>) -> Self {
        Self::new(platform, SKIPPED_SOURCE)
    }

    pub fn is_skipped(&self) -> bool {
        self.source == SKIPPED_SOURCE
    }

    pub fn title(&self) -> Option<&str> {
        self.text(FieldKind::Title)
    }

    /// Store a value. Empty values are ignored; returns whether it was stored.
    pub fn set(&mut self, kind: FieldKind, value: FieldValue, source: impl Into<String>) -> bool {
        if value.is_empty() {
            return false;
        }
        self.fields.insert(
            kind,
            Field {
                value,
                source: source.into(),
            },
        );
        true
    }

    pub fn set_text(&mut self, kind: FieldKind, text: impl Into<String>, source: impl Into<String>) -> bool {
        self.set(kind, FieldValue::Text(text.into().trim().to_string()), source)
    }

    pub fn set_list(&mut self, kind: FieldKind, items: Vec<String>, source: impl Into<String>) -> bool {
        let items: Vec<String> = items
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        self.set(kind, FieldValue::List(items), source)
    }

    pub fn set_media(&mut self, kind: FieldKind, media: Media, source: impl Into<String>) -> bool {
        self.set(kind, FieldValue::Media(media), source)
    }

    /// Replace the value of an existing field, keeping its provenance.
    pub fn replace_value(&mut self, kind: FieldKind, value: FieldValue) {
        if let Some(field) = self.fields.get_mut(&kind) {
            field.value = value;
        }
    }

    pub fn get(&self, kind: FieldKind) -> Option<&Field> {
        self.fields.get(&kind)
    }

    pub fn text(&self, kind: FieldKind) -> Option<&str> {
        self.get(kind).and_then(|f| f.value.as_text())
    }

    pub fn list(&self, kind: FieldKind) -> Option<&[String]> {
        self.get(kind).and_then(|f| f.value.as_list())
    }

    pub fn media(&self, kind: FieldKind) -> Option<&Media> {
        self.get(kind).and_then(|f| f.value.as_media())
    }

    pub fn has(&self, kind: FieldKind) -> bool {
        self.fields.contains_key(&kind)
    }

    pub fn remove(&mut self, kind: FieldKind) -> Option<Field> {
        self.fields.remove(&kind)
    }

    pub fn fields(&self) -> impl Iterator<Item = (FieldKind, &Field)> {
        self.fields.iter().map(|(k, f)| (*k, f))
    }

    pub fn kinds(&self) -> impl Iterator<Item = FieldKind> + '_ {
        self.fields.keys().copied()
    }

    /// True when the record holds anything beyond a title.
    pub fn is_meaningful(&self) -> bool {
        self.fields.keys().any(|k| *k != FieldKind::Title)
    }

    /// Copy fields this record lacks from `other`, keeping their provenance.
    /// Returns how many fields were copied.
    pub fn merge_missing_from(&mut self, other: &ResolvedRecord) -> usize {
        let mut copied = 0;
        for (kind, field) in &other.fields {
            if !self.fields.contains_key(kind) {
                self.fields.insert(*kind, field.clone());
                copied += 1;
            }
        }
        copied
    }

    /// Share (0-100) of `expected` kinds present in this record.
    pub fn compute_completeness(&self, expected: &[FieldKind]) -> u8 {
        if expected.is_empty() {
            return 100;
        }
        let present = expected.iter().filter(|k| self.has(**k)).count();
        ((present * 100) / expected.len()) as u8
    }
}

#[cfg(test)]
#[path = "tests/record_tests.rs"]
mod tests;
